//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error(transparent)]
    Remote(#[from] RemoteFault),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Structured fault returned by the remote data service
///
/// Callers decide whether to retry; nothing in the core retries on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Remote fault {status}: {message}")]
pub struct RemoteFault {
    pub status: u16,
    pub message: String,
}

impl RemoteFault {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// A single rejected line of a guard file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct GuardParseError {
    pub line: usize,
    pub message: String,
}
