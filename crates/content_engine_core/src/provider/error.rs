//! Generation failure taxonomy.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure inside `Strategy::generate`, fatal to the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A required credential (env var name) is not configured.
    MissingCredential(&'static str),
    /// Request could not be sent or the response body could not be read.
    Transport(String),
    /// Provider answered with a non-success HTTP status.
    Status { status: u16, body: String },
    /// Provider response carried no extractable text. `raw` is truncated.
    MissingText { raw: String },
    /// Extracted text was not parseable as the expected JSON shape.
    InvalidJson { text: String, message: String },
    /// Parsed output violates the strategy's expectations.
    InvalidOutput(String),
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential(name) => write!(f, "missing env: {name}"),
            Self::Transport(message) => write!(f, "provider transport failed: {message}"),
            Self::Status { status, body } => write!(f, "provider error {status}: {body}"),
            Self::MissingText { raw } => write!(f, "provider response missing text. raw={raw}"),
            Self::InvalidJson { text, message } => write!(
                f,
                "failed to parse JSON from model output ({message}): {text}"
            ),
            Self::InvalidOutput(message) => write!(f, "invalid model output: {message}"),
        }
    }
}

impl Error for GenerationError {}
