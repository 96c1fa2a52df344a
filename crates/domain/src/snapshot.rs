//! The persisted subset of client state.

use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionOverrides, ExecutionResult, ExecutionSettings};
use crate::job::JobId;
use crate::matching::MatchResult;
use crate::ui::UiSelectionState;

/// Name under which the snapshot is stored.
pub const SNAPSHOT_NAME: &str = "harmatch-state";

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Client state that survives a restart.
///
/// In-flight flags and the hydration flag are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    /// Layout version; mismatches are discarded on load.
    pub version: u32,
    /// Active job, if any.
    #[serde(default)]
    pub job_id: Option<JobId>,
    /// File name of the active job.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Request count of the active job.
    #[serde(default)]
    pub total_requests: u32,
    /// Last prompt typed.
    #[serde(default)]
    pub prompt: String,
    /// Last committed match.
    #[serde(default)]
    pub match_result: Option<MatchResult>,
    /// Execution overrides.
    #[serde(default)]
    pub overrides: ExecutionOverrides,
    /// Execution settings.
    #[serde(default)]
    pub execution_settings: ExecutionSettings,
    /// Number of committed executions.
    #[serde(default)]
    pub execution_count: u32,
    /// Last committed execution result.
    #[serde(default)]
    pub execution_result: Option<ExecutionResult>,
    /// Tab selections.
    #[serde(default)]
    pub ui: UiSelectionState,
}
