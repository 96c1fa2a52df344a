//! Harmatch Domain - Core data types
//!
//! This crate defines the data model shared by the Harmatch client:
//! jobs, captured items, match and execution results, and the persisted
//! snapshot. All types here are pure Rust with no I/O dependencies.

pub mod columns;
pub mod error;
pub mod execution;
pub mod item;
pub mod job;
pub mod matching;
pub mod snapshot;
pub mod ui;

pub use columns::{ColumnKey, ColumnWidths, MIN_COLUMN_WIDTH};
pub use error::{DomainError, DomainResult};
pub use execution::{
    DEFAULT_TIMEOUT_SECONDS, EchoedRequest, ExecutionError, ExecutionErrorKind,
    ExecutionOverrides, ExecutionResponse, ExecutionResult, ExecutionSettings, ExecutionTiming,
    OverrideKind, OverrideUpdate,
};
pub use item::{
    AuthInfo, HeaderParam, ItemDetails, ItemId, ItemParameters, ItemTiming, JobItem, QueryParam,
    QueryValue, ResponseInfo,
};
pub use job::{Job, JobId, JobStatus, UploadFile};
pub use matching::{DEFAULT_MAX_CANDIDATES, MatchResult, MatchedRequest};
pub use snapshot::{PersistedSnapshot, SNAPSHOT_NAME, SNAPSHOT_VERSION};
pub use ui::{DetailsTab, ParamsTab, ResponseTab, UiSelectionState};

/// Splits `KEY=VALUE` at the first `=`.
///
/// # Errors
///
/// Returns `DomainError::InvalidPair` if there is no `=` or the key is empty.
pub fn parse_pair(raw: &str) -> DomainResult<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(DomainError::InvalidPair(raw.to_string())),
    }
}
