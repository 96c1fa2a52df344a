//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the state engine and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod pointer;
mod remote_service;
mod storage;

pub use pointer::PointerCapture;
pub use remote_service::{
    ExecuteItemRequest, HealthStatus, MatchQuery, Operation, RemoteErrorKind, RemoteResult,
    RemoteService, RemoteServiceError,
};
pub use storage::SnapshotStorage;
