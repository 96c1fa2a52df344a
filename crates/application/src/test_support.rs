//! Fixtures and fakes shared by the unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use harmatch_domain::{
    EchoedRequest, ExecutionError, ExecutionErrorKind, ExecutionResponse, ExecutionResult,
    ExecutionTiming, ItemDetails, ItemId, Job, JobId, JobItem, JobStatus, MatchResult,
    MatchedRequest, PersistedSnapshot, UploadFile,
};
use parking_lot::Mutex;

use crate::ApplicationResult;
use crate::ports::{
    ExecuteItemRequest, HealthStatus, MatchQuery, Operation, RemoteResult, RemoteService,
    RemoteServiceError, SnapshotStorage,
};

pub fn job_id(raw: &str) -> JobId {
    JobId::new(raw).unwrap_or_else(|e| panic!("{e}"))
}

pub fn job(id: &str, status: JobStatus) -> Job {
    Job::submitted(job_id(id), "capture.har", status)
}

pub fn sample_match(item_id: ItemId) -> MatchResult {
    MatchResult {
        curl_command: format!("curl 'https://api.example.com/items/{item_id}'"),
        matched_request: MatchedRequest {
            url: format!("https://api.example.com/items/{item_id}"),
            method: "GET".to_string(),
            domain: "api.example.com".to_string(),
            path: format!("/items/{item_id}"),
            status_code: Some(200),
            content_type: Some("application/json".to_string()),
        },
        selected_request_id: item_id,
        model_used: "test-model".to_string(),
    }
}

pub fn success_result() -> ExecutionResult {
    ExecutionResult::Success {
        request: EchoedRequest {
            url: "https://api.example.com/items/1".to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
        },
        response: ExecutionResponse {
            status_code: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            body: "{}".to_string(),
            size_bytes: Some(2),
        },
        timing: ExecutionTiming {
            execution_time_ms: 42,
            ..ExecutionTiming::default()
        },
    }
}

pub fn auth_failure() -> ExecutionResult {
    ExecutionResult::Failure {
        request: EchoedRequest {
            url: "https://api.example.com/items/1".to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
        },
        error: ExecutionError {
            kind: ExecutionErrorKind::Authentication,
            message: "Authentication required".to_string(),
            details: Some("401 Unauthorized".to_string()),
            suggestions: vec!["Add an Authorization header".to_string()],
        },
        timing: ExecutionTiming {
            execution_time_ms: 17,
            ..ExecutionTiming::default()
        },
        response: None,
    }
}

/// A scripted reply: wait `delay`, then return `result`.
type Scripted<T> = (Duration, RemoteResult<T>);

/// Remote service fake. Each operation replays a queue of scripted
/// replies; the last status reply per job repeats once the queue drains.
#[derive(Default)]
pub struct MockRemoteService {
    statuses: Mutex<HashMap<JobId, VecDeque<Scripted<Job>>>>,
    matches: Mutex<VecDeque<Scripted<MatchResult>>>,
    executions: Mutex<VecDeque<Scripted<ExecutionResult>>>,
    status_calls: AtomicUsize,
    execute_requests: Mutex<Vec<ExecuteItemRequest>>,
}

impl MockRemoteService {
    pub fn script_status(&self, id: &str, delay: Duration, result: RemoteResult<Job>) {
        self.statuses
            .lock()
            .entry(job_id(id))
            .or_default()
            .push_back((delay, result));
    }

    pub fn script_match(&self, delay: Duration, result: RemoteResult<MatchResult>) {
        self.matches.lock().push_back((delay, result));
    }

    pub fn script_execution(&self, delay: Duration, result: RemoteResult<ExecutionResult>) {
        self.executions.lock().push_back((delay, result));
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn execute_requests(&self) -> Vec<ExecuteItemRequest> {
        self.execute_requests.lock().clone()
    }

    fn next_status(&self, id: &JobId) -> Scripted<Job> {
        let mut statuses = self.statuses.lock();
        let queue = statuses.entry(id.clone()).or_default();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| unreachable!())
        } else {
            queue.front().cloned().unwrap_or((
                Duration::ZERO,
                Err(RemoteServiceError::transport(Operation::FetchStatus)),
            ))
        }
    }
}

impl RemoteService for MockRemoteService {
    async fn submit_file(&self, _file: &UploadFile) -> RemoteResult<Job> {
        Err(RemoteServiceError::transport(Operation::SubmitFile))
    }

    async fn submit_url(&self, _url: &str) -> RemoteResult<Job> {
        Err(RemoteServiceError::transport(Operation::SubmitUrl))
    }

    async fn fetch_status(&self, job_id: &JobId) -> RemoteResult<Job> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = self.next_status(job_id);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_job_items(&self, _job_id: &JobId) -> RemoteResult<Vec<JobItem>> {
        Ok(Vec::new())
    }

    async fn generate_match(&self, _query: &MatchQuery) -> RemoteResult<MatchResult> {
        let next = self.matches.lock().pop_front();
        let (delay, result) = next.unwrap_or((
            Duration::ZERO,
            Err(RemoteServiceError::transport(Operation::GenerateMatch)),
        ));
        tokio::time::sleep(delay).await;
        result
    }

    async fn download_match(&self, _query: &MatchQuery) -> RemoteResult<String> {
        Err(RemoteServiceError::transport(Operation::DownloadMatch))
    }

    async fn fetch_item_details(&self, _item_id: ItemId) -> RemoteResult<ItemDetails> {
        Err(RemoteServiceError::transport(Operation::FetchItemDetails))
    }

    async fn execute_item(&self, request: &ExecuteItemRequest) -> RemoteResult<ExecutionResult> {
        self.execute_requests.lock().push(request.clone());
        let next = self.executions.lock().pop_front();
        let (delay, result) = next.unwrap_or((
            Duration::ZERO,
            Err(RemoteServiceError::transport(Operation::ExecuteItem)),
        ));
        tokio::time::sleep(delay).await;
        result
    }

    async fn health(&self) -> RemoteResult<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
        })
    }
}

/// In-memory snapshot backend that counts writes.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<PersistedSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn with_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn stored(&self) -> Option<PersistedSnapshot> {
        self.snapshot.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn load(&self) -> ApplicationResult<Option<PersistedSnapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> ApplicationResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> ApplicationResult<()> {
        *self.snapshot.lock() = None;
        Ok(())
    }
}
