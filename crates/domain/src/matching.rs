//! Semantic match results.

use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// Summary of the captured request chosen by a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRequest {
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Host portion of the URL.
    pub domain: String,
    /// Path portion of the URL.
    pub path: String,
    /// Recorded response status.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Recorded response content type.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Output of a generate-match call.
///
/// The four fields only ever travel together: the store holds an
/// `Option<MatchResult>` so a partial match cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Executable curl command reproducing the request.
    pub curl_command: String,
    /// Summary of the matched request.
    pub matched_request: MatchedRequest,
    /// Identifier of the matched item.
    pub selected_request_id: ItemId,
    /// Model that performed the match.
    pub model_used: String,
}

/// Default number of candidates the service shortlists before matching.
pub const DEFAULT_MAX_CANDIDATES: u32 = 10;
