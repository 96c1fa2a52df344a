//! Harmatch Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the HTTP remote service client,
//! snapshot storage backends, and client configuration.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestRemoteService;
pub use config::{ClientConfig, ConfigError, DEFAULT_BASE_URL};
pub use persistence::{FileSnapshotStorage, MemorySnapshotStorage, SnapshotError};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
