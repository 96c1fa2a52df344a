//! Process-local snapshot storage.

use async_trait::async_trait;
use harmatch_application::{ApplicationResult, SnapshotStorage};
use harmatch_domain::PersistedSnapshot;
use parking_lot::Mutex;

/// Keeps the snapshot in memory; it is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySnapshotStorage {
    snapshot: Mutex<Option<PersistedSnapshot>>,
}

impl MemorySnapshotStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Returns a copy of the stored snapshot.
    #[must_use]
    pub fn stored(&self) -> Option<PersistedSnapshot> {
        self.snapshot.lock().clone()
    }
}

#[async_trait]
impl SnapshotStorage for MemorySnapshotStorage {
    async fn load(&self) -> ApplicationResult<Option<PersistedSnapshot>> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> ApplicationResult<()> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> ApplicationResult<()> {
        self.snapshot.lock().take();
        Ok(())
    }
}
