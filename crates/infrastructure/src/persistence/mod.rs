//! Snapshot storage backends.

mod memory;
mod snapshot_repository;

pub use memory::MemorySnapshotStorage;
pub use snapshot_repository::{FileSnapshotStorage, SnapshotError};
