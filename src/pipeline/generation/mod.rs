//! Generation collaborator seam.
//!
//! The language model is external. Everything in the crate talks to it
//! through `GenerationClient`, a blocking trait; async callers run it on
//! the blocking pool.

pub mod ollama;
pub mod types;

pub use ollama::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Generation service is not reachable at {0}")]
    Connection(String),

    #[error("Generation service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generation returned no usable content")]
    Empty,

    #[error("Generation task failed: {0}")]
    Task(String),
}
