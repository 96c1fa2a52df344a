//! Server-tracked jobs and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Opaque identifier the remote service assigns to a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a raw identifier, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidJobId` if the identifier is empty or
    /// whitespace only.
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidJobId(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Lifecycle state of a job. Transitions are owned by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    #[default]
    Pending,
    /// A worker is parsing the artifact.
    Processing,
    /// Parsing finished; items are available.
    Completed,
    /// Parsing failed permanently.
    Failed,
}

impl JobStatus {
    /// Returns true once the remote service will no longer change the status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::UnknownJobStatus(other.to_string())),
        }
    }
}

/// A unit of work tracked by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Server-assigned identifier.
    pub id: JobId,
    /// Name of the uploaded file, or the captured URL.
    pub file_name: String,
    /// Number of requests extracted so far.
    pub total_requests: u32,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// When the service accepted the job, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<NaiveDateTime>,
}

impl Job {
    /// Creates a freshly submitted job with no extracted requests yet.
    #[must_use]
    pub fn submitted(id: JobId, file_name: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            total_requests: 0,
            status,
            uploaded_at: None,
        }
    }
}

/// An artifact to upload: the file name and its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent with the multipart part.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Creates a new upload payload.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}
