//! Captured requests extracted from a job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-side identifier of a captured request.
pub type ItemId = i64;

/// One captured request as listed for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobItem {
    /// Item identifier.
    pub id: ItemId,
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Host portion of the URL.
    pub domain: String,
    /// Path portion of the URL.
    pub path: String,
    /// Recorded response status, if any.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Recorded response content type, if any.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Capture timestamp as reported by the service.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Recorded round-trip duration.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Authentication scheme detected on a captured request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Whether any credential header was found.
    pub detected: bool,
    /// Scheme name (`bearer`, `basic`, `api_key`, `cookie`, `custom`).
    #[serde(default, rename = "type")]
    pub scheme: Option<String>,
    /// Header carrying the credential.
    #[serde(default)]
    pub header_name: Option<String>,
    /// Masked value shape, e.g. `Bearer ***`.
    #[serde(default)]
    pub value_pattern: Option<String>,
}

/// A query parameter on a captured request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    /// Parameter name.
    pub name: String,
    /// Parameter value, a list when the key was repeated.
    pub value: QueryValue,
}

/// Value of a query parameter. A key repeated in the URL
/// (`?tag=a&tag=b`) arrives as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Key appeared once.
    One(String),
    /// Key appeared several times, in URL order.
    Many(Vec<String>),
}

impl QueryValue {
    /// Every value in URL order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

/// A header on a captured request. Credential values arrive masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParam {
    /// Header name.
    pub name: String,
    /// Header value, `***` when `is_auth`.
    pub value: String,
    /// Whether the header carries a credential.
    #[serde(default)]
    pub is_auth: bool,
}

/// Parameters the captured request was sent with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemParameters {
    /// Query parameters.
    #[serde(default)]
    pub query: Vec<QueryParam>,
    /// Request headers.
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
    /// Parsed or raw request body.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Body encoding (`json`, `form`, `text`...).
    #[serde(default)]
    pub body_type: Option<String>,
}

/// Recorded response summary for a captured request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseInfo {
    /// Recorded status code.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Recorded content type.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Recorded body size.
    #[serde(default)]
    pub size_bytes: Option<u64>,
    /// Truncated body text.
    #[serde(default)]
    pub body_preview: Option<String>,
    /// Recorded response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Recorded timing breakdown. Phases the capture lacked are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemTiming {
    /// Total round trip.
    #[serde(default)]
    pub total_ms: Option<u64>,
    /// DNS lookup.
    #[serde(default)]
    pub dns_ms: Option<u64>,
    /// TCP/TLS connect.
    #[serde(default)]
    pub connect_ms: Option<u64>,
    /// Request send.
    #[serde(default)]
    pub send_ms: Option<u64>,
    /// Time to first byte.
    #[serde(default)]
    pub wait_ms: Option<u64>,
    /// Body receive.
    #[serde(default)]
    pub receive_ms: Option<u64>,
}

/// Full analysis of a single captured request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetails {
    /// Item identifier.
    pub request_id: ItemId,
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Host portion of the URL.
    pub domain: String,
    /// Path portion of the URL.
    pub path: String,
    /// Detected authentication.
    #[serde(default)]
    pub authentication: AuthInfo,
    /// Request parameters.
    #[serde(default)]
    pub parameters: ItemParameters,
    /// Recorded response.
    #[serde(default)]
    pub response_info: ResponseInfo,
    /// Recorded timing.
    #[serde(default)]
    pub timing: ItemTiming,
}
