//! Wire formats of the remote service.
//!
//! These mirror the JSON the service sends and accepts. Conversion into
//! domain types happens here so the adapter only moves bytes.

use chrono::{DateTime, NaiveDateTime};
use harmatch_application::{ExecuteItemRequest, MatchQuery};
use harmatch_domain::{
    EchoedRequest, ExecutionError, ExecutionErrorKind, ExecutionOverrides, ExecutionResponse,
    ExecutionResult, ExecutionTiming, Job, JobId, JobItem, JobStatus, MatchResult,
    MatchedRequest,
};
use serde::{Deserialize, Serialize};

/// `{detail}` body of a failed call.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Reply of both submission endpoints.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: JobStatus,
}

impl SubmitResponse {
    pub fn into_job(self, file_name: &str) -> Option<Job> {
        let id = JobId::new(self.job_id).ok()?;
        Some(Job::submitted(id, file_name, self.status))
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitUrlBody<'a> {
    pub url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub job_id: String,
    #[serde(default)]
    pub filename: String,
    pub status: JobStatus,
    #[serde(default)]
    pub total_requests: u32,
    #[serde(default)]
    pub upload_timestamp: Option<String>,
}

impl StatusResponse {
    pub fn into_job(self) -> Option<Job> {
        let uploaded_at = self.upload_timestamp.as_deref().and_then(parse_timestamp);
        Some(Job {
            id: JobId::new(self.job_id).ok()?,
            file_name: self.filename,
            total_requests: self.total_requests,
            status: self.status,
            uploaded_at,
        })
    }
}

/// Accepts naive ISO timestamps as well as RFC 3339 ones with an offset.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
}

/// Item list; both `{job_id, total_requests, requests}` and
/// `{requests, total}` decode.
#[derive(Debug, Deserialize)]
pub struct JobItemsResponse {
    pub requests: Vec<JobItem>,
}

#[derive(Debug, Serialize)]
pub struct GenerateBody<'a> {
    pub job_id: &'a str,
    pub prompt: &'a str,
    pub max_candidates: u32,
}

impl<'a> From<&'a MatchQuery> for GenerateBody<'a> {
    fn from(query: &'a MatchQuery) -> Self {
        Self {
            job_id: query.job_id.as_str(),
            prompt: &query.prompt,
            max_candidates: query.max_candidates,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub curl_command: String,
    pub matched_request: MatchedRequest,
    pub request_id: i64,
    #[serde(default)]
    pub model_used: String,
}

impl From<GenerateResponse> for MatchResult {
    fn from(r: GenerateResponse) -> Self {
        Self {
            curl_command: r.curl_command,
            matched_request: r.matched_request,
            selected_request_id: r.request_id,
            model_used: r.model_used,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExecuteBody<'a> {
    pub request_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<&'a ExecutionOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
}

impl<'a> From<&'a ExecuteItemRequest> for ExecuteBody<'a> {
    fn from(request: &'a ExecuteItemRequest) -> Self {
        Self {
            request_id: request.item_id,
            overrides: request.overrides.as_ref(),
            timeout: request.settings.map(|s| s.timeout_seconds),
            follow_redirects: request.settings.map(|s| s.follow_redirects),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub request: EchoedRequest,
    #[serde(default)]
    pub response: Option<ExecutionResponse>,
    #[serde(default)]
    pub timing: ExecutionTiming,
    #[serde(default)]
    pub error: Option<ExecutionError>,
}

impl ExecuteResponse {
    /// `None` when a success carries no response.
    pub fn into_result(self) -> Option<ExecutionResult> {
        if self.success {
            return Some(ExecutionResult::Success {
                request: self.request,
                response: self.response?,
                timing: self.timing,
            });
        }
        let error = self.error.unwrap_or_else(|| ExecutionError {
            kind: ExecutionErrorKind::Unknown,
            message: "Request failed".to_string(),
            details: None,
            suggestions: Vec::new(),
        });
        Some(ExecutionResult::Failure {
            request: self.request,
            error,
            timing: self.timing,
            response: self.response,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
