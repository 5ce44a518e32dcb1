//! Desk HTTP API.
//!
//! JSON endpoints under `/api/` for registration, the patient registry,
//! OPD slips, identification logging, emergency admission and clinical
//! drafts. Authentication is handled by the hospital gateway in front of
//! this service.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
