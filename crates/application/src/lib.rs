//! Harmatch Application - Client state synchronization engine
//!
//! This crate defines:
//! - Port traits (remote service, snapshot storage, pointer capture)
//! - The persistent application store and its hydration lifecycle
//! - The job status poller
//! - Mutation coordinators for match generation and request execution
//! - The column resize state machine

pub mod coordinators;
pub mod error;
pub mod poller;
pub mod ports;
pub mod resize;
pub mod store;

#[cfg(test)]
mod test_support;

pub use coordinators::{ExecuteRequest, ExecuteRequestInput, GenerateMatch, GenerateMatchInput};
pub use error::{ApplicationError, ApplicationResult};
pub use poller::{JobStatusPoller, POLL_INTERVAL, PollState, next_poll_delay};
pub use ports::{
    ExecuteItemRequest, HealthStatus, MatchQuery, Operation, PointerCapture, RemoteErrorKind,
    RemoteResult, RemoteService, RemoteServiceError, SnapshotStorage,
};
pub use resize::{ColumnResizeController, DragSession, ResizeError};
pub use store::{AppState, AppStore, CallToken};
