//! Job status polling.
//!
//! A `JobStatusPoller` turns an optional job identifier into a live
//! subscription: while the job is `pending` or `processing` it fetches the
//! status every `POLL_INTERVAL`; once a fetch returns `completed` or
//! `failed` it stops. Changing or clearing the identifier aborts the
//! running loop, and a generation counter inside the watch channel makes
//! sure a response that was already in flight is never published.

use std::sync::Arc;
use std::time::Duration;

use harmatch_domain::{Job, JobId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ports::{RemoteService, RemoteServiceError};
use crate::store::AppStore;

/// Fixed delay between two status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Delay before the next fetch given the last known job.
///
/// `Duration::ZERO` means no further fetch. A job that has not been
/// fetched successfully yet keeps polling.
#[must_use]
pub fn next_poll_delay(job: Option<&Job>) -> Duration {
    match job {
        Some(job) if job.status.is_terminal() => Duration::ZERO,
        _ => POLL_INTERVAL,
    }
}

/// What the poller currently knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    /// Job being observed, `None` when disabled.
    pub job_id: Option<JobId>,
    /// Latest successfully decoded job.
    pub job: Option<Job>,
    /// Error of the latest fetch, cleared by the next success.
    pub error: Option<RemoteServiceError>,
    generation: u64,
}

impl PollState {
    /// True once the observed job reached a terminal status.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.status.is_terminal())
    }
}

/// Polls the status of at most one job at a time.
///
/// Dropping the poller aborts any scheduled fetch.
pub struct JobStatusPoller<C: RemoteService + 'static> {
    client: Arc<C>,
    store: Option<AppStore>,
    state: Arc<watch::Sender<PollState>>,
    task: Option<JoinHandle<()>>,
}

impl<C: RemoteService + 'static> JobStatusPoller<C> {
    /// Creates a disabled poller.
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            client,
            store: None,
            state: Arc::new(state),
            task: None,
        }
    }

    /// Also records every fetched status into `store`.
    #[must_use]
    pub fn with_store(mut self, store: AppStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> PollState {
        self.state.borrow().clone()
    }

    /// Returns true while a fetch is running or scheduled.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Points the poller at `job_id`, or disables it with `None`.
    ///
    /// Setting the identifier already observed is a no-op. Otherwise the
    /// previous loop is aborted before the new one starts, and its
    /// in-flight response is discarded. Must be called within a Tokio
    /// runtime when `job_id` is `Some`.
    pub fn set_job(&mut self, job_id: Option<JobId>) {
        if self.state.borrow().job_id == job_id {
            return;
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = state.generation + 1;
            *state = PollState {
                job_id: job_id.clone(),
                job: None,
                error: None,
                generation,
            };
        });

        let Some(job_id) = job_id else {
            debug!("status polling disabled");
            return;
        };

        debug!(%job_id, "status polling started");
        self.task = Some(tokio::spawn(poll_loop(
            Arc::clone(&self.client),
            self.store.clone(),
            Arc::clone(&self.state),
            job_id,
            generation,
        )));
    }

    /// Waits until the current job settles, returning the final state.
    ///
    /// Returns `None` if polling is disabled or the job is switched away
    /// before it settles.
    pub async fn settled(&self) -> Option<PollState> {
        let mut rx = self.subscribe();
        let generation = rx.borrow().generation;
        rx.borrow().job_id.as_ref()?;
        let state = rx
            .wait_for(|state| state.generation != generation || state.is_settled())
            .await
            .ok()?
            .clone();
        (state.generation == generation).then_some(state)
    }
}

impl<C: RemoteService + 'static> Drop for JobStatusPoller<C> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop<C: RemoteService>(
    client: Arc<C>,
    store: Option<AppStore>,
    state: Arc<watch::Sender<PollState>>,
    job_id: JobId,
    generation: u64,
) {
    loop {
        let outcome = client.fetch_status(&job_id).await;

        let mut delay = POLL_INTERVAL;
        let published = state.send_if_modified(|current| {
            if current.generation != generation {
                return false;
            }
            match &outcome {
                Ok(job) => {
                    current.job = Some(job.clone());
                    current.error = None;
                }
                Err(e) => current.error = Some(e.clone()),
            }
            delay = next_poll_delay(current.job.as_ref());
            true
        });

        if !published {
            debug!(%job_id, "discarding stale status response");
            return;
        }

        match (&outcome, &store) {
            (Ok(job), Some(store)) => store.record_job_status(job),
            (Err(e), _) => debug!(%job_id, error = %e, "status fetch failed"),
            _ => {}
        }

        if delay.is_zero() {
            info!(%job_id, "job settled, polling stopped");
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Operation;
    use crate::test_support::{MemoryStorage, MockRemoteService, job, job_id};
    use harmatch_domain::JobStatus;
    use tokio::time::Instant;

    #[test]
    fn terminal_jobs_have_zero_delay() {
        for status in [JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(next_poll_delay(Some(&job("j", status))), Duration::ZERO);
        }
    }

    #[test]
    fn active_jobs_poll_every_two_seconds() {
        for status in [JobStatus::Pending, JobStatus::Processing] {
            assert_eq!(
                next_poll_delay(Some(&job("j", status))),
                Duration::from_millis(2000)
            );
        }
        assert_eq!(next_poll_delay(None), POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_completed() {
        let client = Arc::new(MockRemoteService::default());
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Pending)));
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Processing)));
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Completed)));

        let mut poller = JobStatusPoller::new(client.clone());
        let started = Instant::now();
        poller.set_job(Some(job_id("j1")));

        let state = poller.settled().await.expect("settles");
        assert_eq!(state.job.map(|j| j.status), Some(JobStatus::Completed));
        assert_eq!(client.status_calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(4000));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(client.status_calls(), 3);
        assert!(!poller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_poller_does_nothing() {
        let client = Arc::new(MockRemoteService::default());
        let mut poller = JobStatusPoller::new(client.clone());
        poller.set_job(None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.status_calls(), 0);
        assert!(!poller.is_polling());
        assert_eq!(poller.settled().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_keeps_polling_and_last_job() {
        let client = Arc::new(MockRemoteService::default());
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Processing)));
        client.script_status(
            "j1",
            Duration::ZERO,
            Err(RemoteServiceError::transport(Operation::FetchStatus)),
        );
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Failed)));

        let mut poller = JobStatusPoller::new(client.clone());
        let mut rx = poller.subscribe();
        poller.set_job(Some(job_id("j1")));

        let errored = rx
            .wait_for(|s| s.error.is_some())
            .await
            .expect("channel open")
            .clone();
        assert_eq!(errored.job.map(|j| j.status), Some(JobStatus::Processing));
        assert!(poller.is_polling());

        let state = poller.settled().await.expect("settles");
        assert_eq!(state.error, None);
        assert_eq!(state.job.map(|j| j.status), Some(JobStatus::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_jobs_discards_in_flight_response() {
        let client = Arc::new(MockRemoteService::default());
        client.script_status(
            "slow",
            Duration::from_millis(500),
            Ok(job("slow", JobStatus::Completed)),
        );
        client.script_status("fast", Duration::ZERO, Ok(job("fast", JobStatus::Processing)));

        let mut poller = JobStatusPoller::new(client.clone());
        let mut rx = poller.subscribe();
        poller.set_job(Some(job_id("slow")));
        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.set_job(Some(job_id("fast")));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.job_id, Some(job_id("fast")));
        assert_eq!(state.job.map(|j| j.id), Some(job_id("fast")));
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_job_cancels_schedule() {
        let client = Arc::new(MockRemoteService::default());
        client.script_status("j1", Duration::ZERO, Ok(job("j1", JobStatus::Pending)));

        let mut poller = JobStatusPoller::new(client.clone());
        poller.set_job(Some(job_id("j1")));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let calls = client.status_calls();
        assert_eq!(calls, 2);

        poller.set_job(None);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.status_calls(), calls);
        assert_eq!(poller.current(), PollState {
            generation: 2,
            ..PollState::default()
        });
    }

    #[tokio::test(start_paused = true)]
    async fn statuses_flow_into_store() {
        let client = Arc::new(MockRemoteService::default());
        let mut done = job("j1", JobStatus::Completed);
        done.total_requests = 25;
        client.script_status("j1", Duration::ZERO, Ok(done));

        let store = AppStore::new(Arc::new(MemoryStorage::default()));
        store.hydrate().await;
        store.set_job_id(job_id("j1"), "capture.har", 0);

        let mut poller = JobStatusPoller::new(client).with_store(store.clone());
        poller.set_job(store.job_id());
        poller.settled().await.expect("settles");

        assert_eq!(
            store.read(|s| (s.job_status, s.total_requests)),
            (Some(JobStatus::Completed), 25)
        );
    }
}
