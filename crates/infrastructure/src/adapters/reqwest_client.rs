//! Remote service client using reqwest.
//!
//! This adapter implements the `RemoteService` port over HTTP. Every
//! failure is normalized into `RemoteServiceError`: a non-success response
//! surfaces its `{detail}` verbatim when it has one, anything else falls
//! back to the operation's fixed message.

use harmatch_application::{
    ExecuteItemRequest, HealthStatus, MatchQuery, Operation, RemoteResult, RemoteService,
    RemoteServiceError,
};
use harmatch_domain::{
    ExecutionResult, ItemDetails, ItemId, Job, JobId, JobItem, MatchResult, UploadFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::wire::{
    ErrorBody, ExecuteBody, ExecuteResponse, GenerateBody, GenerateResponse, HealthResponse,
    JobItemsResponse, StatusResponse, SubmitResponse, SubmitUrlBody,
};
use crate::config::{ClientConfig, ConfigError};

/// Remote service client backed by `reqwest::Client`.
///
/// Calls are single request/response exchanges with no retries; the only
/// timeout is the optional transport timeout from `ClientConfig`.
#[derive(Debug, Clone)]
pub struct ReqwestRemoteService {
    client: Client,
    base_url: String,
}

impl ReqwestRemoteService {
    /// Creates a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder =
            Client::builder().user_agent(concat!("harmatch/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a client around an existing reqwest client.
    #[must_use]
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and turns any non-success outcome into the
    /// operation's error.
    async fn send(operation: Operation, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await.map_err(|e| {
            debug!(?operation, error = %e, "request did not complete");
            RemoteServiceError::transport(operation)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = match response.bytes().await {
            Ok(body) => match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(body) => Some(body.detail),
                Err(_) => {
                    warn!(?operation, %status, "error body carries no detail");
                    None
                }
            },
            Err(_) => None,
        };
        Err(RemoteServiceError::server(operation, status.as_u16(), detail))
    }

    async fn decode<T: DeserializeOwned>(
        operation: Operation,
        response: Response,
    ) -> RemoteResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|_| RemoteServiceError::transport(operation))?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(?operation, error = %e, "undecodable response");
            RemoteServiceError::decode(operation)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
    ) -> RemoteResult<T> {
        let url = self.endpoint(path);
        debug!(?operation, %url, "GET");
        let response = Self::send(operation, self.client.get(url)).await?;
        Self::decode(operation, response).await
    }

    async fn post_json<B, T>(&self, operation: Operation, path: &str, body: &B) -> RemoteResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(?operation, %url, "POST");
        let response = Self::send(operation, self.client.post(url).json(body)).await?;
        Self::decode(operation, response).await
    }
}

impl RemoteService for ReqwestRemoteService {
    async fn submit_file(&self, file: &UploadFile) -> RemoteResult<Job> {
        let operation = Operation::SubmitFile;
        let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(mime.essence_str())
            .map_err(|_| RemoteServiceError::transport(operation))?;

        let url = self.endpoint("/upload-har");
        debug!(?operation, %url, file = %file.file_name, "POST multipart");
        let request = self.client.post(url).multipart(Form::new().part("file", part));
        let response = Self::send(operation, request).await?;
        let reply: SubmitResponse = Self::decode(operation, response).await?;
        reply
            .into_job(&file.file_name)
            .ok_or_else(|| RemoteServiceError::decode(operation))
    }

    async fn submit_url(&self, url: &str) -> RemoteResult<Job> {
        let operation = Operation::SubmitUrl;
        let reply: SubmitResponse = self
            .post_json(operation, "/url-to-har", &SubmitUrlBody { url })
            .await?;
        reply
            .into_job(url)
            .ok_or_else(|| RemoteServiceError::decode(operation))
    }

    async fn fetch_status(&self, job_id: &JobId) -> RemoteResult<Job> {
        let operation = Operation::FetchStatus;
        let reply: StatusResponse = self
            .get_json(operation, &format!("/status/{job_id}"))
            .await?;
        reply
            .into_job()
            .ok_or_else(|| RemoteServiceError::decode(operation))
    }

    async fn fetch_job_items(&self, job_id: &JobId) -> RemoteResult<Vec<JobItem>> {
        let reply: JobItemsResponse = self
            .get_json(Operation::FetchJobItems, &format!("/job/{job_id}/requests"))
            .await?;
        Ok(reply.requests)
    }

    async fn generate_match(&self, query: &MatchQuery) -> RemoteResult<MatchResult> {
        let reply: GenerateResponse = self
            .post_json(Operation::GenerateMatch, "/generate-curl", &GenerateBody::from(query))
            .await?;
        Ok(reply.into())
    }

    async fn download_match(&self, query: &MatchQuery) -> RemoteResult<String> {
        let operation = Operation::DownloadMatch;
        let url = self.endpoint("/generate-curl/download");
        debug!(?operation, %url, "POST");
        let request = self.client.post(url).json(&GenerateBody::from(query));
        let response = Self::send(operation, request).await?;
        response
            .text()
            .await
            .map_err(|_| RemoteServiceError::transport(operation))
    }

    async fn fetch_item_details(&self, item_id: ItemId) -> RemoteResult<ItemDetails> {
        self.get_json(Operation::FetchItemDetails, &format!("/request/{item_id}/details"))
            .await
    }

    async fn execute_item(&self, request: &ExecuteItemRequest) -> RemoteResult<ExecutionResult> {
        let operation = Operation::ExecuteItem;
        let reply: ExecuteResponse = self
            .post_json(operation, "/execute-request", &ExecuteBody::from(request))
            .await?;
        reply
            .into_result()
            .ok_or_else(|| RemoteServiceError::decode(operation))
    }

    async fn health(&self) -> RemoteResult<HealthStatus> {
        let reply: HealthResponse = self.get_json(Operation::Health, "/health").await?;
        Ok(HealthStatus {
            status: reply.status,
        })
    }
}
