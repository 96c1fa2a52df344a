//! Remote processing service port

use std::future::Future;

use harmatch_domain::{
    ExecutionOverrides, ExecutionResult, ExecutionSettings, ItemDetails, ItemId, Job, JobId,
    JobItem, MatchResult, UploadFile,
};
use thiserror::Error;

/// One remote capability. Each has a fixed fallback message used when a
/// failure carries no decodable `detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `POST /upload-har`
    SubmitFile,
    /// `POST /url-to-har`
    SubmitUrl,
    /// `GET /status/{job_id}`
    FetchStatus,
    /// `GET /job/{job_id}/requests`
    FetchJobItems,
    /// `POST /generate-curl`
    GenerateMatch,
    /// `POST /generate-curl/download`
    DownloadMatch,
    /// `GET /request/{id}/details`
    FetchItemDetails,
    /// `POST /execute-request`
    ExecuteItem,
    /// `GET /health`
    Health,
}

impl Operation {
    /// Message used when the service gives no usable `detail`.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::SubmitFile => "Upload failed",
            Self::SubmitUrl => "URL conversion failed",
            Self::FetchStatus => "Failed to fetch status",
            Self::FetchJobItems => "Failed to fetch requests",
            Self::GenerateMatch => "Failed to generate curl command",
            Self::DownloadMatch => "Failed to download curl command",
            Self::FetchItemDetails => "Failed to fetch request details",
            Self::ExecuteItem => "Failed to execute request",
            Self::Health => "Health check failed",
        }
    }
}

/// Where a remote failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The service answered with a non-success status.
    Server {
        /// HTTP status code.
        status: u16,
    },
    /// The request never produced a response.
    Transport,
    /// A success response could not be decoded.
    Decode,
}

/// Uniform error raised by every `RemoteService` operation.
///
/// `Display` is exactly `message`: the server's `detail` verbatim, or the
/// operation's fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteServiceError {
    /// Failing operation.
    pub operation: Operation,
    /// Failure origin.
    pub kind: RemoteErrorKind,
    /// User-facing message.
    pub message: String,
}

impl RemoteServiceError {
    /// Error for a non-success response; uses `detail` when present.
    #[must_use]
    pub fn server(operation: Operation, status: u16, detail: Option<String>) -> Self {
        Self {
            operation,
            kind: RemoteErrorKind::Server { status },
            message: detail.unwrap_or_else(|| operation.fallback_message().to_string()),
        }
    }

    /// Error for a request that produced no response.
    #[must_use]
    pub fn transport(operation: Operation) -> Self {
        Self {
            operation,
            kind: RemoteErrorKind::Transport,
            message: operation.fallback_message().to_string(),
        }
    }

    /// Error for a success response with an undecodable payload.
    #[must_use]
    pub fn decode(operation: Operation) -> Self {
        Self {
            operation,
            kind: RemoteErrorKind::Decode,
            message: operation.fallback_message().to_string(),
        }
    }

    /// Returns the HTTP status for server errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            RemoteErrorKind::Server { status } => Some(status),
            _ => None,
        }
    }
}

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteServiceError>;

/// Arguments of a generate-match call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    /// Job whose items are searched.
    pub job_id: JobId,
    /// Natural-language description of the wanted request.
    pub prompt: String,
    /// Shortlist size before model matching.
    pub max_candidates: u32,
}

/// Arguments of an execute-item call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteItemRequest {
    /// Captured request to replay.
    pub item_id: ItemId,
    /// Replacements to apply, if any.
    pub overrides: Option<ExecutionOverrides>,
    /// Timeout and redirect policy; service defaults when `None`.
    pub settings: Option<ExecutionSettings>,
}

/// Reported service health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Status string, `healthy` when up.
    pub status: String,
}

impl HealthStatus {
    /// Returns true when the service reports itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Port for the remote processing service.
///
/// One operation per remote capability, each a single request/response
/// call. Implementations normalize every failure into
/// `RemoteServiceError` and never retry.
pub trait RemoteService: Send + Sync {
    /// Uploads an artifact and returns the created job.
    fn submit_file(&self, file: &UploadFile) -> impl Future<Output = RemoteResult<Job>> + Send;

    /// Asks the service to capture a URL and returns the created job.
    fn submit_url(&self, url: &str) -> impl Future<Output = RemoteResult<Job>> + Send;

    /// Fetches the current state of a job.
    fn fetch_status(&self, job_id: &JobId) -> impl Future<Output = RemoteResult<Job>> + Send;

    /// Lists the requests extracted for a job.
    fn fetch_job_items(
        &self,
        job_id: &JobId,
    ) -> impl Future<Output = RemoteResult<Vec<JobItem>>> + Send;

    /// Finds the item best matching a prompt and renders it as curl.
    fn generate_match(
        &self,
        query: &MatchQuery,
    ) -> impl Future<Output = RemoteResult<MatchResult>> + Send;

    /// Like `generate_match` but returns only the curl command text.
    fn download_match(
        &self,
        query: &MatchQuery,
    ) -> impl Future<Output = RemoteResult<String>> + Send;

    /// Fetches the analysis of one captured request.
    fn fetch_item_details(
        &self,
        item_id: ItemId,
    ) -> impl Future<Output = RemoteResult<ItemDetails>> + Send;

    /// Replays a captured request through the service.
    fn execute_item(
        &self,
        request: &ExecuteItemRequest,
    ) -> impl Future<Output = RemoteResult<ExecutionResult>> + Send;

    /// Probes service health.
    fn health(&self) -> impl Future<Output = RemoteResult<HealthStatus>> + Send;
}
