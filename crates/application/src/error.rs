//! Application error types

use harmatch_domain::DomainError;
use thiserror::Error;

use crate::ports::RemoteServiceError;

/// Application-level errors.
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The remote service call failed. Displays the normalized message only.
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    /// A snapshot storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A newer invocation or a reset replaced this call; its result was
    /// not committed.
    #[error("result discarded: superseded by a newer call")]
    Superseded,
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
