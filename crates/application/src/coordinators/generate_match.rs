//! Generate-match coordinator.

use std::sync::Arc;

use harmatch_domain::{DEFAULT_MAX_CANDIDATES, JobId, MatchResult};
use tracing::debug;

use crate::ports::{MatchQuery, RemoteService};
use crate::store::AppStore;
use crate::{ApplicationError, ApplicationResult};

/// Input for a generate-match call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateMatchInput {
    /// Job whose items are searched.
    pub job_id: JobId,
    /// Natural-language description of the wanted request.
    pub prompt: String,
    /// Shortlist size before model matching.
    pub max_candidates: u32,
}

impl GenerateMatchInput {
    /// Creates an input with the default candidate count.
    #[must_use]
    pub fn new(job_id: JobId, prompt: impl Into<String>) -> Self {
        Self {
            job_id,
            prompt: prompt.into(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Overrides the candidate count.
    #[must_use]
    pub const fn with_max_candidates(mut self, max_candidates: u32) -> Self {
        self.max_candidates = max_candidates;
        self
    }
}

/// Asks the remote service for the item matching a prompt and commits
/// the `MatchResult` to the store as one write.
///
/// While the call is in flight `is_generating` is true and the previous
/// match stays visible. A failure leaves the previous match untouched and
/// is returned to the caller only.
pub struct GenerateMatch<C: RemoteService> {
    client: Arc<C>,
    store: AppStore,
}

impl<C: RemoteService> GenerateMatch<C> {
    /// Creates the coordinator.
    pub const fn new(client: Arc<C>, store: AppStore) -> Self {
        Self { client, store }
    }

    /// Runs one generate-match call.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Remote` if the service call fails, or
    /// `ApplicationError::Superseded` if a newer call or a job change
    /// replaced this one before it completed. A match requested for a job
    /// that is not the active one is also reported as superseded.
    pub async fn execute(&self, input: GenerateMatchInput) -> ApplicationResult<MatchResult> {
        let token = self.store.begin_generation(&input.job_id);
        let query = MatchQuery {
            job_id: input.job_id,
            prompt: input.prompt,
            max_candidates: input.max_candidates,
        };

        match self.client.generate_match(&query).await {
            Ok(result) => {
                if self.store.commit_match(&token, result.clone()) {
                    Ok(result)
                } else {
                    debug!(job_id = %query.job_id, "discarding superseded match");
                    Err(ApplicationError::Superseded)
                }
            }
            Err(e) => {
                self.store.finish_generation(&token);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Operation, RemoteServiceError};
    use crate::test_support::{MemoryStorage, MockRemoteService, job_id, sample_match};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    async fn setup() -> (Arc<MockRemoteService>, AppStore) {
        let store = AppStore::new(Arc::new(MemoryStorage::default()));
        store.hydrate().await;
        store.set_job_id(job_id("j1"), "capture.har", 10);
        (Arc::new(MockRemoteService::default()), store)
    }

    #[tokio::test]
    async fn success_commits_match() {
        let (client, store) = setup().await;
        client.script_match(Duration::ZERO, Ok(sample_match(4)));
        let coordinator = GenerateMatch::new(client, store.clone());

        let result = coordinator
            .execute(GenerateMatchInput::new(job_id("j1"), "get item"))
            .await;

        assert_eq!(result.ok(), Some(sample_match(4)));
        let state = store.state();
        assert_eq!(state.match_result, Some(sample_match(4)));
        assert!(!state.is_generating);
    }

    #[tokio::test]
    async fn failure_leaves_previous_match() {
        let (client, store) = setup().await;
        client.script_match(Duration::ZERO, Ok(sample_match(4)));
        client.script_match(
            Duration::ZERO,
            Err(RemoteServiceError::server(
                Operation::GenerateMatch,
                404,
                Some("No matching requests found for the given prompt".to_string()),
            )),
        );
        let coordinator = GenerateMatch::new(client, store.clone());
        coordinator
            .execute(GenerateMatchInput::new(job_id("j1"), "get item"))
            .await
            .expect("first call succeeds");
        let before = store.state();

        let err = coordinator
            .execute(GenerateMatchInput::new(job_id("j1"), "nothing like this"))
            .await
            .expect_err("second call fails");

        assert_eq!(
            err.to_string(),
            "No matching requests found for the given prompt"
        );
        assert_eq!(store.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn flag_is_set_while_in_flight() {
        let (client, store) = setup().await;
        client.script_match(Duration::from_millis(300), Ok(sample_match(9)));
        let coordinator = Arc::new(GenerateMatch::new(client, store.clone()));

        let running = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .execute(GenerateMatchInput::new(job_id("j1"), "x"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.read(|s| s.is_generating));
        assert_eq!(store.read(|s| s.match_result.clone()), None);

        let result = running.await.expect("task completes");
        assert!(result.is_ok());
        assert!(!store.read(|s| s.is_generating));
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_call_commits() {
        let (client, store) = setup().await;
        client.script_match(Duration::from_millis(500), Ok(sample_match(1)));
        client.script_match(Duration::from_millis(100), Ok(sample_match(2)));
        let coordinator = Arc::new(GenerateMatch::new(client, store.clone()));

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .execute(GenerateMatchInput::new(job_id("j1"), "first"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = coordinator
            .execute(GenerateMatchInput::new(job_id("j1"), "second"))
            .await;

        let first = first.await.expect("task completes");
        assert!(matches!(first, Err(ApplicationError::Superseded)));
        assert_eq!(second.ok().map(|m| m.selected_request_id), Some(2));
        assert_eq!(store.state().selected_request_id(), Some(2));
        assert!(!store.read(|s| s.is_generating));
    }

    #[tokio::test]
    async fn match_for_other_job_is_not_committed() {
        let (client, store) = setup().await;
        client.script_match(Duration::ZERO, Ok(sample_match(7)));
        let coordinator = GenerateMatch::new(client, store.clone());

        let result = coordinator
            .execute(GenerateMatchInput::new(job_id("j2"), "get item"))
            .await;

        assert!(matches!(result, Err(ApplicationError::Superseded)));
        let state = store.state();
        assert_eq!(state.job_id, Some(job_id("j1")));
        assert_eq!(state.match_result, None);
        assert!(!state.is_generating);
    }
}
