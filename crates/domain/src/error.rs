//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A job identifier is empty or malformed.
    #[error("invalid job identifier: {0}")]
    InvalidJobId(String),

    /// A job status string is not one of the known lifecycle states.
    #[error("unknown job status: {0}")]
    UnknownJobStatus(String),

    /// A `key=value` pair could not be split.
    #[error("expected KEY=VALUE, got: {0}")]
    InvalidPair(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
