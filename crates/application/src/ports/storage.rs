//! Snapshot storage port

use async_trait::async_trait;
use harmatch_domain::PersistedSnapshot;

use crate::ApplicationResult;

/// Port for the named client-side snapshot.
///
/// Loading is asynchronous; saving is write-through so that a mutation
/// and its persistence happen in the same synchronous step.
///
/// `save` and `clear` are called while the store's write lock is held,
/// often from inside a Tokio task. Implementations must not await or
/// block for long; a file backend should keep to one small local write.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Loads the stored snapshot, `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or parsed.
    async fn load(&self) -> ApplicationResult<Option<PersistedSnapshot>>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    fn save(&self, snapshot: &PersistedSnapshot) -> ApplicationResult<()>;

    /// Removes the stored snapshot. Used by `AppStore::reset_state`.
    /// Clearing an empty backend succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn clear(&self) -> ApplicationResult<()>;
}
