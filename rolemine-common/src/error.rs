//! Common error types for the role mining wizard

use serde::Serialize;
use thiserror::Error;

/// Common result type for wizard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Field-level validation failure
///
/// Surfaced inline next to the offending control; blocks progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Field or control the error belongs to (e.g. "files", "minUsersPerRole")
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure talking to the role mining backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Connection refused, DNS failure, or no backend configured
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Request exceeded the configured timeout
    #[error("Backend request timed out: {0}")]
    Timeout(String),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Could not decode backend response: {0}")]
    Decode(String),
}

/// Common error types across the wizard crates
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user input (file batch, numeric config field)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend call failed and the failure policy chose to surface it
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Requested action is not allowed from the current wizard step
    #[error("Cannot {action} from step {from}")]
    InvalidTransition { from: String, action: String },

    /// Another asynchronous operation is already in flight
    #[error("Busy: {0}")]
    Busy(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(ValidationError::new(field, message))
    }
}
