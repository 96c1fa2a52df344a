//! Cosmetic tab selections.

use serde::{Deserialize, Serialize};

/// Active tab of the item details panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailsTab {
    /// Generated curl command.
    #[default]
    Curl,
    /// Captured request analysis.
    Details,
    /// Live execution.
    Execute,
}

/// Active tab of the override editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsTab {
    /// Query parameters.
    #[default]
    Query,
    /// Headers.
    Headers,
    /// Body.
    Body,
}

/// Active tab of the execution response viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTab {
    /// Response body.
    #[default]
    Body,
    /// Response headers.
    Headers,
    /// Echoed request.
    Request,
}

/// One active value per tab axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiSelectionState {
    /// Details panel tab.
    #[serde(default)]
    pub details_tab: DetailsTab,
    /// Override editor tab.
    #[serde(default)]
    pub params_tab: ParamsTab,
    /// Response viewer tab.
    #[serde(default)]
    pub response_tab: ResponseTab,
}
