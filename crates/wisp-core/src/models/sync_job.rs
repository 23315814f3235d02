//! Sync job run record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{SiteId, SyncJobId};

/// Kind of synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncJobType {
    /// Complete re-walk of the bound tree
    Full,
    /// Incremental walk that refreshes changed published pages
    Poll,
}

impl SyncJobType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Poll => "POLL",
        }
    }
}

impl fmt::Display for SyncJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncJobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL" => Ok(Self::Full),
            "POLL" => Ok(Self::Poll),
            other => Err(format!("unknown sync job type: {other}")),
        }
    }
}

/// Lifecycle state of a sync job run.
///
/// A row is created directly in `Running`; there is no persisted pending
/// state before execution. The terminal state is set exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncJobStatus {
    Running,
    Succeeded,
    Failed,
}

impl SyncJobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SyncJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncJobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown sync job status: {other}")),
        }
    }
}

/// Persistent record of one orchestrator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncJob {
    /// Unique identifier
    pub id: SyncJobId,
    pub site_id: SiteId,
    pub job_type: SyncJobType,
    pub status: SyncJobStatus,
    /// Start timestamp (Unix ms)
    pub started_at: i64,
    /// Finish timestamp (Unix ms), set with the terminal state
    pub finished_at: Option<i64>,
    /// Stringified error for failed runs
    pub error: Option<String>,
}

impl SyncJob {
    /// Create a running job record with the start time set to now
    #[must_use]
    pub fn running(site_id: SiteId, job_type: SyncJobType) -> Self {
        Self {
            id: SyncJobId::new(),
            site_id,
            job_type,
            status: SyncJobStatus::Running,
            started_at: chrono::Utc::now().timestamp_millis(),
            finished_at: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_status_roundtrip() {
        for job_type in [SyncJobType::Full, SyncJobType::Poll] {
            assert_eq!(job_type, job_type.as_str().parse().unwrap());
        }
        for status in [
            SyncJobStatus::Running,
            SyncJobStatus::Succeeded,
            SyncJobStatus::Failed,
        ] {
            assert_eq!(status, status.as_str().parse().unwrap());
        }
    }

    #[test]
    fn test_running_job_has_no_terminal_fields() {
        let job = SyncJob::running(SiteId::new(), SyncJobType::Poll);
        assert_eq!(job.status, SyncJobStatus::Running);
        assert!(job.started_at > 0);
        assert_eq!(job.finished_at, None);
        assert_eq!(job.error, None);
    }
}
