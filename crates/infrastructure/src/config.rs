//! Client configuration.
//!
//! Values come from the environment:
//! - `HARMATCH_API_URL`: service base URL (default `http://localhost:8000`)
//! - `HARMATCH_TIMEOUT_SECS`: transport timeout for every call
//! - `HARMATCH_STATE_PATH`: snapshot file location

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::persistence::FileSnapshotStorage;

/// Default service location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable holding the base URL.
pub const API_URL_VAR: &str = "HARMATCH_API_URL";

/// Environment variable holding the transport timeout in seconds.
pub const TIMEOUT_VAR: &str = "HARMATCH_TIMEOUT_SECS";

/// Environment variable holding the snapshot path.
pub const STATE_PATH_VAR: &str = "HARMATCH_STATE_PATH";

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL could not be parsed.
    #[error("invalid base URL {value:?}: {source}")]
    InvalidBaseUrl {
        /// Raw value.
        value: String,
        /// Parse failure.
        source: url::ParseError,
    },

    /// The timeout is not a whole number of seconds.
    #[error("invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Where the service lives and where client state is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL; operation paths are appended to it.
    pub base_url: Url,
    /// Transport timeout for every call, none by default.
    pub request_timeout: Option<Duration>,
    /// Snapshot file; the platform data directory when `None`.
    pub state_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = get(API_URL_VAR);
        let mut config = Self::for_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.state_path = get(STATE_PATH_VAR).map(PathBuf::from);
        Ok(config)
    }

    /// Configuration pointing at `raw`, with no timeout and the default
    /// snapshot location.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not an absolute URL.
    pub fn for_base_url(raw: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            source,
        })?;
        Ok(Self {
            base_url,
            request_timeout: None,
            state_path: None,
        })
    }

    /// Sets the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Resolved snapshot file, if any location is available.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.state_path
            .clone()
            .or_else(FileSnapshotStorage::default_path)
    }
}
