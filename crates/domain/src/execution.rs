//! Live request execution: overrides, settings, and results.
//!
//! An execution replays a captured request through the remote service,
//! optionally with parts of it replaced. The outcome is always data:
//! a structured failure (`success = false`) is a normal `ExecutionResult`,
//! not an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of a captured request an override replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKind {
    /// Query string parameters.
    Query,
    /// Request headers.
    Headers,
    /// Request body.
    Body,
}

/// A replacement for exactly one override field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideUpdate {
    /// Replace all query parameters.
    Query(BTreeMap<String, String>),
    /// Replace all headers.
    Headers(BTreeMap<String, String>),
    /// Replace the body; `None` sends the captured body.
    Body(Option<String>),
}

impl OverrideUpdate {
    /// Returns the field this update targets.
    #[must_use]
    pub const fn kind(&self) -> OverrideKind {
        match self {
            Self::Query(_) => OverrideKind::Query,
            Self::Headers(_) => OverrideKind::Headers,
            Self::Body(_) => OverrideKind::Body,
        }
    }
}

/// Client-supplied replacements applied before execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionOverrides {
    /// Replacement query parameters.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    /// Extra or replacement headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Replacement body.
    #[serde(default)]
    pub body: Option<String>,
}

impl ExecutionOverrides {
    /// Replaces the targeted field and leaves the other two untouched.
    pub fn apply(&mut self, update: OverrideUpdate) {
        match update {
            OverrideUpdate::Query(params) => self.query_params = params,
            OverrideUpdate::Headers(headers) => self.headers = headers,
            OverrideUpdate::Body(body) => self.body = body,
        }
    }

    /// Returns true when no field overrides the captured request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_params.is_empty() && self.headers.is_empty() && self.body.is_none()
    }
}

/// Default execution timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 30;

/// Transport settings forwarded with an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Upstream request timeout.
    pub timeout_seconds: u32,
    /// Whether redirects are followed.
    pub follow_redirects: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            follow_redirects: true,
        }
    }
}

/// The outbound request as actually sent by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EchoedRequest {
    /// Final URL including override query string.
    #[serde(default)]
    pub url: String,
    /// HTTP method.
    #[serde(default)]
    pub method: String,
    /// Headers sent, when echoed.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Upstream response returned by an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Reason phrase.
    #[serde(default)]
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body as text.
    #[serde(default)]
    pub body: String,
    /// Body size in bytes.
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Timing measured by the service for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionTiming {
    /// Wall time of the upstream call.
    pub execution_time_ms: u64,
    /// DNS lookup, when measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_ms: Option<u64>,
    /// Connect, when measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_ms: Option<u64>,
}

/// Classification of a structured execution failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionErrorKind {
    /// 400 from upstream.
    BadRequest,
    /// 401 from upstream.
    Authentication,
    /// 403 from upstream.
    Authorization,
    /// 404 from upstream.
    NotFound,
    /// 429 from upstream.
    RateLimit,
    /// Other 4xx.
    Client,
    /// 5xx from upstream.
    Server,
    /// Upstream did not answer in time.
    Timeout,
    /// Connection could not be established.
    Connection,
    /// Connect phase timed out.
    ConnectionTimeout,
    /// Malformed HTTP exchange.
    Protocol,
    /// Redirect loop or limit.
    Redirect,
    /// URL could not be parsed.
    InvalidUrl,
    /// Target domain is on the service blocklist.
    BlockedDomain,
    /// Unclassified failure.
    Unknown,
    /// A kind this client does not know yet.
    Other(String),
}

impl ExecutionErrorKind {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Authentication => "authentication_error",
            Self::Authorization => "authorization_error",
            Self::NotFound => "not_found",
            Self::RateLimit => "rate_limit_error",
            Self::Client => "client_error",
            Self::Server => "server_error",
            Self::Timeout => "timeout_error",
            Self::Connection => "connection_error",
            Self::ConnectionTimeout => "connection_timeout",
            Self::Protocol => "protocol_error",
            Self::Redirect => "redirect_error",
            Self::InvalidUrl => "invalid_url",
            Self::BlockedDomain => "blocked_domain",
            Self::Unknown => "unknown_error",
            Self::Other(name) => name,
        }
    }

    /// Returns a human-readable title for this error type.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Authentication => "Authentication Required",
            Self::Authorization => "Access Denied",
            Self::NotFound => "Not Found",
            Self::RateLimit => "Rate Limited",
            Self::Client => "Client Error",
            Self::Server => "Server Error",
            Self::Timeout => "Request Timeout",
            Self::Connection => "Connection Failed",
            Self::ConnectionTimeout => "Connection Timeout",
            Self::Protocol => "Protocol Error",
            Self::Redirect => "Redirect Error",
            Self::InvalidUrl => "Invalid URL",
            Self::BlockedDomain => "Blocked Domain",
            Self::Unknown => "Unknown Error",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ExecutionErrorKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "bad_request" => Self::BadRequest,
            "authentication_error" => Self::Authentication,
            "authorization_error" => Self::Authorization,
            "not_found" => Self::NotFound,
            "rate_limit_error" => Self::RateLimit,
            "client_error" => Self::Client,
            "server_error" => Self::Server,
            "timeout_error" => Self::Timeout,
            "connection_error" => Self::Connection,
            "connection_timeout" => Self::ConnectionTimeout,
            "protocol_error" => Self::Protocol,
            "redirect_error" => Self::Redirect,
            "invalid_url" => Self::InvalidUrl,
            "blocked_domain" => Self::BlockedDomain,
            "unknown_error" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl From<ExecutionErrorKind> for String {
    fn from(kind: ExecutionErrorKind) -> Self {
        match kind {
            ExecutionErrorKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of why an execution failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Failure classification.
    #[serde(rename = "type")]
    pub kind: ExecutionErrorKind,
    /// Short human-readable message.
    pub message: String,
    /// Longer detail, often the upstream body.
    #[serde(default)]
    pub details: Option<String>,
    /// Remediation hints.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Upstream answered successfully.
    Success {
        /// Request as sent.
        request: EchoedRequest,
        /// Upstream response.
        response: ExecutionResponse,
        /// Measured timing.
        timing: ExecutionTiming,
    },
    /// The service classified the attempt as failed.
    Failure {
        /// Request as sent.
        request: EchoedRequest,
        /// Failure description.
        error: ExecutionError,
        /// Measured timing.
        timing: ExecutionTiming,
        /// Upstream response, when one arrived (4xx/5xx).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<ExecutionResponse>,
    },
}

impl ExecutionResult {
    /// Returns true for the `Success` variant.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the echoed outbound request.
    #[must_use]
    pub const fn request(&self) -> &EchoedRequest {
        match self {
            Self::Success { request, .. } | Self::Failure { request, .. } => request,
        }
    }

    /// Returns the measured timing.
    #[must_use]
    pub const fn timing(&self) -> &ExecutionTiming {
        match self {
            Self::Success { timing, .. } | Self::Failure { timing, .. } => timing,
        }
    }

    /// Returns the upstream response if one arrived.
    #[must_use]
    pub const fn response(&self) -> Option<&ExecutionResponse> {
        match self {
            Self::Success { response, .. } => Some(response),
            Self::Failure { response, .. } => response.as_ref(),
        }
    }

    /// Returns the failure description for the `Failure` variant.
    #[must_use]
    pub const fn error(&self) -> Option<&ExecutionError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}
