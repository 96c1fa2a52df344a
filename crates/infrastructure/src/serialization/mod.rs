//! Deterministic JSON serialization for the state file.
//!
//! The snapshot is written with sorted map keys, 2-space indentation and a
//! trailing newline so that it diffs cleanly between saves.

mod json;

pub use json::*;
