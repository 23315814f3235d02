//! Job lifecycle tracking around orchestrator invocations.
//!
//! Every run gets a persistent record: created directly in `Running`, then
//! moved to `Succeeded` or `Failed` exactly once. A row left in `Running`
//! after a process crash is an operational anomaly reconciled externally.

use crate::db::SyncJobRepository;
use crate::error::Result;
use crate::models::{SiteId, SyncJob, SyncJobId, SyncJobStatus, SyncJobType};

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Records run state transitions for one orchestrator invocation
pub struct JobTracker<'a, J: SyncJobRepository> {
    jobs: &'a J,
}

impl<'a, J: SyncJobRepository> JobTracker<'a, J> {
    pub const fn new(jobs: &'a J) -> Self {
        Self { jobs }
    }

    /// Persist a new job directly in the Running state
    pub async fn start(&self, site_id: SiteId, job_type: SyncJobType) -> Result<SyncJob> {
        let job = SyncJob::running(site_id, job_type);
        self.jobs.create(&job).await?;
        Ok(job)
    }

    pub async fn succeed(&self, id: &SyncJobId) -> Result<()> {
        self.jobs
            .finish(id, SyncJobStatus::Succeeded, now_ms(), None)
            .await
    }

    pub async fn fail(&self, id: &SyncJobId, error: &str) -> Result<()> {
        self.jobs
            .finish(id, SyncJobStatus::Failed, now_ms(), Some(error))
            .await
    }
}
