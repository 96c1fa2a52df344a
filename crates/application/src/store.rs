//! Persistent application store.
//!
//! `AppStore` is the single source of truth for client state. Its
//! lifecycle is `new` (in-memory defaults, not hydrated) → `hydrate`
//! (restore the persisted snapshot, flip `hydrated` once) → synchronous
//! mutations → `reset_state`. Every mutation after hydration is written
//! through to the `SnapshotStorage` backend.
//!
//! Asynchronous results are fenced with `CallToken`s: a coordinator takes a
//! token before awaiting the remote call and presents it at commit time.
//! Only the newest token for that coordinator, issued under the same job,
//! may commit. `reset_state` invalidates every outstanding token.

use std::sync::Arc;

use harmatch_domain::{
    DetailsTab, ExecutionOverrides, ExecutionResult, ExecutionSettings, ItemId, Job, JobId,
    JobStatus, MatchResult, OverrideUpdate, ParamsTab, PersistedSnapshot, ResponseTab,
    SNAPSHOT_VERSION, UiSelectionState,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ports::SnapshotStorage;

/// Everything the client knows. Job-scoped fields are meaningless while
/// `job_id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AppState {
    /// Active job.
    pub job_id: Option<JobId>,
    /// File name (or URL) of the active job.
    pub file_name: Option<String>,
    /// Requests extracted for the active job.
    pub total_requests: u32,
    /// Last status observed by the poller. Not persisted.
    pub job_status: Option<JobStatus>,
    /// Prompt text.
    pub prompt: String,
    /// Last committed match.
    pub match_result: Option<MatchResult>,
    /// A generate-match call is in flight.
    pub is_generating: bool,
    /// Execution overrides.
    pub overrides: ExecutionOverrides,
    /// Execution settings.
    pub execution_settings: ExecutionSettings,
    /// An execution is in flight.
    pub is_executing: bool,
    /// Last committed execution result.
    pub execution_result: Option<ExecutionResult>,
    /// Number of committed executions.
    pub execution_count: u32,
    /// Tab selections.
    pub ui: UiSelectionState,
}

impl AppState {
    /// Extracts the persisted subset.
    #[must_use]
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            version: SNAPSHOT_VERSION,
            job_id: self.job_id.clone(),
            file_name: self.file_name.clone(),
            total_requests: self.total_requests,
            prompt: self.prompt.clone(),
            match_result: self.match_result.clone(),
            overrides: self.overrides.clone(),
            execution_settings: self.execution_settings,
            execution_count: self.execution_count,
            execution_result: self.execution_result.clone(),
            ui: self.ui,
        }
    }

    /// Builds a state from a snapshot. Transient fields start at defaults.
    #[must_use]
    pub fn from_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            job_id: snapshot.job_id,
            file_name: snapshot.file_name,
            total_requests: snapshot.total_requests,
            prompt: snapshot.prompt,
            match_result: snapshot.match_result,
            overrides: snapshot.overrides,
            execution_settings: snapshot.execution_settings,
            execution_count: snapshot.execution_count,
            execution_result: snapshot.execution_result,
            ui: snapshot.ui,
            ..Self::default()
        }
    }

    /// Returns the selected item of the current match, if any.
    #[must_use]
    pub fn selected_request_id(&self) -> Option<ItemId> {
        self.match_result.as_ref().map(|m| m.selected_request_id)
    }
}

/// Ticket for one asynchronous coordinator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToken {
    seq: u64,
    job_id: Option<JobId>,
}

#[derive(Debug, Default)]
struct Inner {
    state: AppState,
    hydrated: bool,
    generate_seq: u64,
    execute_seq: u64,
    last_saved: Option<PersistedSnapshot>,
}

impl Inner {
    fn token_is_current(&self, token: &CallToken, seq: u64) -> bool {
        token.seq == seq && token.job_id == self.state.job_id
    }
}

/// Shared handle to the client state. Cloning shares the same state.
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<RwLock<Inner>>,
    storage: Arc<dyn SnapshotStorage>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AppStore")
            .field("state", &inner.state)
            .field("hydrated", &inner.hydrated)
            .finish_non_exhaustive()
    }
}

impl AppStore {
    /// Creates a store with in-memory defaults. Nothing is read from or
    /// written to `storage` until `hydrate` completes.
    #[must_use]
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            storage,
        }
    }

    /// Restores the persisted snapshot and marks the store hydrated.
    ///
    /// Runs at most once; later calls return immediately. A failed or
    /// incompatible load keeps the current state and still completes
    /// hydration.
    pub async fn hydrate(&self) {
        if self.is_hydrated() {
            return;
        }

        let loaded = self.storage.load().await;

        let mut inner = self.inner.write();
        if inner.hydrated {
            return;
        }
        match loaded {
            Ok(Some(snapshot)) if snapshot.version == SNAPSHOT_VERSION => {
                inner.state = AppState::from_snapshot(snapshot);
            }
            Ok(Some(snapshot)) => {
                warn!(
                    version = snapshot.version,
                    expected = SNAPSHOT_VERSION,
                    "ignoring snapshot with incompatible version"
                );
            }
            Ok(None) => debug!("no persisted snapshot"),
            Err(e) => warn!(error = %e, "failed to load snapshot, keeping defaults"),
        }
        inner.last_saved = Some(inner.state.snapshot());
        inner.hydrated = true;
        info!(job_id = ?inner.state.job_id, "store hydrated");
    }

    /// Whether persisted-origin fields can be trusted yet.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.inner.read().hydrated
    }

    /// Returns a copy of the whole state.
    #[must_use]
    pub fn state(&self) -> AppState {
        self.inner.read().state.clone()
    }

    /// Reads the state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.read().state)
    }

    /// Returns the active job identifier.
    #[must_use]
    pub fn job_id(&self) -> Option<JobId> {
        self.read(|s| s.job_id.clone())
    }

    /// Applies `f` to the state and writes the result through to storage.
    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.write();
        let out = f(&mut inner);
        if inner.hydrated {
            let snapshot = inner.state.snapshot();
            if inner.last_saved.as_ref() != Some(&snapshot) {
                match self.storage.save(&snapshot) {
                    Ok(()) => inner.last_saved = Some(snapshot),
                    Err(e) => warn!(error = %e, "failed to persist snapshot"),
                }
            }
        }
        out
    }

    /// Makes `job_id` the active job.
    pub fn set_job_id(&self, job_id: JobId, file_name: impl Into<String>, total_requests: u32) {
        let file_name = file_name.into();
        self.mutate(|inner| {
            inner.state.job_id = Some(job_id);
            inner.state.job_status = None;
            inner.state.file_name = Some(file_name);
            inner.state.total_requests = total_requests;
        });
    }

    /// Records a status observed for a job. Ignored unless it is the
    /// active job.
    pub fn record_job_status(&self, job: &Job) {
        self.mutate(|inner| {
            if inner.state.job_id.as_ref() != Some(&job.id) {
                debug!(job_id = %job.id, "ignoring status for inactive job");
                return;
            }
            inner.state.job_status = Some(job.status);
            inner.state.total_requests = job.total_requests;
        });
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.mutate(|inner| inner.state.prompt = prompt);
    }

    /// Replaces one override field.
    pub fn update_overrides(&self, update: OverrideUpdate) {
        debug!(kind = ?update.kind(), "override updated");
        self.mutate(|inner| inner.state.overrides.apply(update));
    }

    /// Restores all overrides to their defaults.
    pub fn reset_overrides(&self) {
        self.mutate(|inner| inner.state.overrides = ExecutionOverrides::default());
    }

    /// Replaces the execution settings.
    pub fn set_execution_settings(&self, settings: ExecutionSettings) {
        self.mutate(|inner| inner.state.execution_settings = settings);
    }

    /// Selects the details panel tab.
    pub fn set_details_tab(&self, tab: DetailsTab) {
        self.mutate(|inner| inner.state.ui.details_tab = tab);
    }

    /// Selects the override editor tab.
    pub fn set_params_tab(&self, tab: ParamsTab) {
        self.mutate(|inner| inner.state.ui.params_tab = tab);
    }

    /// Selects the response viewer tab.
    pub fn set_response_tab(&self, tab: ResponseTab) {
        self.mutate(|inner| inner.state.ui.response_tab = tab);
    }

    /// Replaces the whole state with its initial value in one step and
    /// invalidates every outstanding `CallToken`.
    ///
    /// Once hydrated, the stored snapshot is removed rather than
    /// overwritten; a later load then yields the same initial state.
    pub fn reset_state(&self) {
        let mut inner = self.inner.write();
        inner.state = AppState::default();
        inner.generate_seq += 1;
        inner.execute_seq += 1;
        if inner.hydrated {
            match self.storage.clear() {
                Ok(()) => inner.last_saved = Some(inner.state.snapshot()),
                Err(e) => {
                    warn!(error = %e, "failed to clear snapshot");
                    inner.last_saved = None;
                }
            }
        }
        info!("state reset");
    }

    /// Marks a generate-match call for `job_id` in flight. Prior results
    /// stay visible.
    ///
    /// The match only commits while `job_id` is the active job, so a
    /// request naming another job is discarded at commit time.
    #[must_use]
    pub fn begin_generation(&self, job_id: &JobId) -> CallToken {
        self.mutate(|inner| {
            inner.generate_seq += 1;
            inner.state.is_generating = true;
            CallToken {
                seq: inner.generate_seq,
                job_id: Some(job_id.clone()),
            }
        })
    }

    /// Commits a match if `token` is still current, and ends the call.
    ///
    /// Returns false if the result was discarded.
    pub fn commit_match(&self, token: &CallToken, result: MatchResult) -> bool {
        self.mutate(|inner| {
            if token.seq != inner.generate_seq {
                return false;
            }
            inner.state.is_generating = false;
            if !inner.token_is_current(token, inner.generate_seq) {
                return false;
            }
            inner.state.match_result = Some(result);
            true
        })
    }

    /// Ends a generate-match call without committing anything.
    pub fn finish_generation(&self, token: &CallToken) {
        self.mutate(|inner| {
            if token.seq == inner.generate_seq {
                inner.state.is_generating = false;
            }
        });
    }

    /// Marks an execution in flight and clears the previous result.
    #[must_use]
    pub fn begin_execution(&self) -> CallToken {
        self.mutate(|inner| {
            inner.execute_seq += 1;
            inner.state.is_executing = true;
            inner.state.execution_result = None;
            CallToken {
                seq: inner.execute_seq,
                job_id: inner.state.job_id.clone(),
            }
        })
    }

    /// Commits an execution result if `token` is still current, and ends
    /// the call.
    ///
    /// Returns false if the result was discarded.
    pub fn commit_execution(&self, token: &CallToken, result: ExecutionResult) -> bool {
        self.mutate(|inner| {
            if token.seq != inner.execute_seq {
                return false;
            }
            inner.state.is_executing = false;
            if !inner.token_is_current(token, inner.execute_seq) {
                return false;
            }
            inner.state.execution_result = Some(result);
            inner.state.execution_count += 1;
            true
        })
    }

    /// Ends an execution without a result.
    pub fn abort_execution(&self, token: &CallToken) {
        self.mutate(|inner| {
            if token.seq == inner.execute_seq {
                inner.state.is_executing = false;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStorage, auth_failure, job_id, sample_match};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    async fn hydrated_store() -> (AppStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        let store = AppStore::new(storage.clone());
        store.hydrate().await;
        (store, storage)
    }

    #[test]
    fn init_is_default_and_not_hydrated() {
        let store = AppStore::new(Arc::new(MemoryStorage::default()));
        assert!(!store.is_hydrated());
        assert_eq!(store.state(), AppState::default());
    }

    #[tokio::test]
    async fn set_job_id_touches_only_job_fields() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 0);

        let expected = AppState {
            job_id: Some(job_id("j1")),
            file_name: Some("a.har".to_string()),
            total_requests: 0,
            ..AppState::default()
        };
        assert_eq!(store.state(), expected);
    }

    #[tokio::test]
    async fn header_override_from_defaults() {
        let (store, _) = hydrated_store().await;
        let headers = BTreeMap::from([("Authorization".to_string(), "Bearer x".to_string())]);
        store.update_overrides(OverrideUpdate::Headers(headers.clone()));

        let overrides = store.read(|s| s.overrides.clone());
        assert_eq!(
            overrides,
            ExecutionOverrides {
                query_params: BTreeMap::new(),
                headers,
                body: None,
            }
        );
    }

    #[tokio::test]
    async fn reset_overrides_replaces_whole_record() {
        let (store, _) = hydrated_store().await;
        store.update_overrides(OverrideUpdate::Body(Some("{}".to_string())));
        store.update_overrides(OverrideUpdate::Query(BTreeMap::from([(
            "q".to_string(),
            "1".to_string(),
        )])));
        store.reset_overrides();
        assert_eq!(store.read(|s| s.overrides.clone()), ExecutionOverrides::default());
    }

    #[tokio::test]
    async fn reset_state_restores_initial_state() {
        let (store, storage) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 12);
        store.set_prompt("login call");
        store.set_details_tab(DetailsTab::Execute);
        store.set_execution_settings(ExecutionSettings {
            timeout_seconds: 5,
            follow_redirects: false,
        });
        let token = store.begin_generation(&job_id("j1"));
        assert!(store.commit_match(&token, sample_match(7)));
        let token = store.begin_execution();
        assert!(store.commit_execution(&token, auth_failure()));

        store.reset_state();

        assert_eq!(store.state(), AppState::default());
        assert_eq!(storage.stored(), None);
        assert!(store.is_hydrated());
    }

    #[tokio::test]
    async fn mutation_after_reset_is_persisted_again() {
        let (store, storage) = hydrated_store().await;
        store.set_prompt("before");
        store.reset_state();
        assert_eq!(storage.stored(), None);

        store.set_prompt("after");
        let stored = storage.stored().map(|s| s.prompt);
        assert_eq!(stored.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn reset_discards_in_flight_results() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 3);
        let generation = store.begin_generation(&job_id("j1"));
        let execution = store.begin_execution();

        store.reset_state();

        assert!(!store.commit_match(&generation, sample_match(1)));
        assert!(!store.commit_execution(&execution, auth_failure()));
        assert_eq!(store.state(), AppState::default());
    }

    #[tokio::test]
    async fn only_latest_generation_commits() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 0);
        let first = store.begin_generation(&job_id("j1"));
        let second = store.begin_generation(&job_id("j1"));

        assert!(!store.commit_match(&first, sample_match(1)));
        assert!(store.read(|s| s.is_generating));
        assert!(store.commit_match(&second, sample_match(2)));
        assert!(!store.read(|s| s.is_generating));
        assert_eq!(store.state().selected_request_id(), Some(2));
    }

    #[tokio::test]
    async fn job_switch_discards_match_but_clears_flag() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 0);
        let token = store.begin_generation(&job_id("j1"));
        store.set_job_id(job_id("j2"), "b.har", 0);

        assert!(!store.commit_match(&token, sample_match(1)));
        let state = store.state();
        assert!(!state.is_generating);
        assert_eq!(state.match_result, None);
    }

    #[tokio::test]
    async fn begin_execution_clears_previous_result() {
        let (store, _) = hydrated_store().await;
        let token = store.begin_execution();
        assert!(store.commit_execution(&token, auth_failure()));
        assert_eq!(store.read(|s| s.execution_count), 1);

        let _token = store.begin_execution();
        let state = store.state();
        assert!(state.is_executing);
        assert_eq!(state.execution_result, None);
    }

    #[tokio::test]
    async fn status_for_other_job_is_ignored() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 0);
        let mut other = crate::test_support::job("j2", JobStatus::Completed);
        other.total_requests = 40;
        store.record_job_status(&other);
        assert_eq!(store.read(|s| (s.job_status, s.total_requests)), (None, 0));

        let mut own = crate::test_support::job("j1", JobStatus::Processing);
        own.total_requests = 9;
        store.record_job_status(&own);
        assert_eq!(
            store.read(|s| (s.job_status, s.total_requests)),
            (Some(JobStatus::Processing), 9)
        );
    }

    #[test]
    fn mutations_before_hydration_are_not_persisted() {
        let storage = Arc::new(MemoryStorage::default());
        let store = AppStore::new(storage.clone());
        store.set_prompt("draft");
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn transient_flags_are_not_persisted() {
        let (store, storage) = hydrated_store().await;
        let saves = storage.save_count();
        let _token = store.begin_generation(&job_id("j1"));
        assert_eq!(storage.save_count(), saves);
    }

    #[tokio::test]
    async fn match_for_inactive_job_is_discarded() {
        let (store, _) = hydrated_store().await;
        store.set_job_id(job_id("j1"), "a.har", 0);
        let token = store.begin_generation(&job_id("j2"));

        assert!(!store.commit_match(&token, sample_match(1)));
        let state = store.state();
        assert!(!state.is_generating);
        assert_eq!(state.match_result, None);
    }
}
