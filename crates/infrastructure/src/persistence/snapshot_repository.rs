//! File-backed snapshot storage.
//!
//! Stores the client snapshot as one JSON file, by default in the
//! platform data directory:
//! - Linux: ~/.local/share/harmatch/harmatch-state.json
//! - macOS: ~/Library/Application Support/harmatch/harmatch-state.json
//! - Windows: %APPDATA%/harmatch/harmatch-state.json

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use harmatch_application::{ApplicationError, ApplicationResult, SnapshotStorage};
use harmatch_domain::{PersistedSnapshot, SNAPSHOT_NAME};
use tokio::fs;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Error type for snapshot file operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// IO error during file operations.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

impl SnapshotError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<SnapshotError> for ApplicationError {
    fn from(e: SnapshotError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Snapshot storage in a single JSON file.
///
/// Saves and clears are small synchronous writes. When called from a
/// multi-threaded Tokio runtime they run inside `block_in_place`, so the
/// worker hands its other tasks off while the file is written.
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    path: PathBuf,
}

impl FileSnapshotStorage {
    /// Creates a storage backed by `path`. Nothing is touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the platform default location, if a data directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("harmatch").join(format!("{SNAPSHOT_NAME}.json")))
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, snapshot: &PersistedSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SnapshotError::io(parent, e))?;
        }

        // Write beside the target and rename so a crash never leaves a
        // truncated file behind.
        let content = to_json_stable_bytes(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| SnapshotError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| SnapshotError::io(&self.path, e))
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn load(&self) -> ApplicationResult<Option<PersistedSnapshot>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file");
                return Ok(None);
            }
            Err(e) => return Err(SnapshotError::io(&self.path, e).into()),
        };

        let snapshot = from_json_bytes(&content).map_err(SnapshotError::from)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> ApplicationResult<()> {
        off_worker(|| self.write(snapshot))?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn clear(&self) -> ApplicationResult<()> {
        match off_worker(|| std::fs::remove_file(&self.path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotError::io(&self.path, e).into()),
        }
    }
}

/// Runs blocking file IO without stalling a multi-threaded runtime's
/// worker. Outside a runtime, or on a current-thread runtime, `f` runs
/// inline.
fn off_worker<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}
