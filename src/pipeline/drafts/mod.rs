//! Clinical draft generation: prompts, output cleanup, parsing and the service.

pub mod parser;
pub mod prompt;
pub mod sanitize;
pub mod service;

pub use service::*;
