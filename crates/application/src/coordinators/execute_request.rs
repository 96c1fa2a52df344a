//! Execute Request coordinator
//!
//! Replays a captured request through the remote service and records the
//! outcome in the store.

use std::sync::Arc;

use harmatch_domain::{ExecutionOverrides, ExecutionResult, ExecutionSettings, ItemId};
use tracing::debug;

use crate::ports::{ExecuteItemRequest, RemoteService};
use crate::store::{AppState, AppStore};
use crate::{ApplicationError, ApplicationResult};

/// Input for an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequestInput {
    /// Captured request to replay.
    pub item_id: ItemId,
    /// Replacements to apply.
    pub overrides: Option<ExecutionOverrides>,
    /// Timeout and redirect policy.
    pub settings: Option<ExecutionSettings>,
}

impl ExecuteRequestInput {
    /// Replays the item as captured, with service defaults.
    #[must_use]
    pub const fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            overrides: None,
            settings: None,
        }
    }

    /// Uses the overrides and settings currently held in `state`.
    /// Empty overrides are not sent.
    #[must_use]
    pub fn from_state(item_id: ItemId, state: &AppState) -> Self {
        Self {
            item_id,
            overrides: (!state.overrides.is_empty()).then(|| state.overrides.clone()),
            settings: Some(state.execution_settings),
        }
    }

    /// Sets the overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ExecutionOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Sets the settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Coordinator for live request execution.
///
/// At invocation start `is_executing` becomes true and the previous
/// result is cleared. Both success and structured failure results are
/// committed as data; only a transport-level failure is returned as an
/// error, leaving `execution_result` empty.
///
/// # Example
///
/// ```ignore
/// let coordinator = ExecuteRequest::new(Arc::new(client), store.clone());
/// let input = ExecuteRequestInput::from_state(42, &store.state());
/// let result = coordinator.execute(input).await?;
/// ```
pub struct ExecuteRequest<C: RemoteService> {
    client: Arc<C>,
    store: AppStore,
}

impl<C: RemoteService> ExecuteRequest<C> {
    /// Creates a new `ExecuteRequest` coordinator.
    pub const fn new(client: Arc<C>, store: AppStore) -> Self {
        Self { client, store }
    }

    /// Executes the item and commits the result.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Remote` if the call itself failed, or
    /// `ApplicationError::Superseded` if a newer execution, a job change or
    /// a reset replaced this one.
    pub async fn execute(&self, input: ExecuteRequestInput) -> ApplicationResult<ExecutionResult> {
        let token = self.store.begin_execution();
        let request = ExecuteItemRequest {
            item_id: input.item_id,
            overrides: input.overrides,
            settings: input.settings,
        };

        match self.client.execute_item(&request).await {
            Ok(result) => {
                if self.store.commit_execution(&token, result.clone()) {
                    Ok(result)
                } else {
                    debug!(item_id = request.item_id, "discarding superseded execution");
                    Err(ApplicationError::Superseded)
                }
            }
            Err(e) => {
                self.store.abort_execution(&token);
                Err(e.into())
            }
        }
    }
}
