//! Sync job repository

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{SiteId, SyncJob, SyncJobId, SyncJobStatus};

/// Trait for sync job record storage (async)
#[allow(async_fn_in_trait)]
pub trait SyncJobRepository {
    /// Insert a job record (already in the Running state)
    async fn create(&self, job: &SyncJob) -> Result<()>;

    /// Set the terminal state of a job exactly once.
    ///
    /// Rows already in a terminal state are left untouched.
    async fn finish(
        &self,
        id: &SyncJobId,
        status: SyncJobStatus,
        finished_at_ms: i64,
        error: Option<&str>,
    ) -> Result<()>;

    /// Get a job by id
    async fn get(&self, id: &SyncJobId) -> Result<Option<SyncJob>>;

    /// List recent jobs for a site, newest first
    async fn list_for_site(&self, site_id: &SiteId, limit: usize) -> Result<Vec<SyncJob>>;
}

/// libSQL implementation of `SyncJobRepository`
pub struct LibSqlSyncJobRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncJobRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_job(row: &libsql::Row) -> Result<SyncJob> {
        let id: String = row.get(0)?;
        let site_id: String = row.get(1)?;
        let job_type: String = row.get(2)?;
        let status: String = row.get(3)?;
        Ok(SyncJob {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid job id: {id}")))?,
            site_id: site_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid site id: {site_id}")))?,
            job_type: job_type.parse().map_err(Error::Database)?,
            status: status.parse().map_err(Error::Database)?,
            started_at: row.get(4)?,
            finished_at: row.get(5)?,
            error: row.get(6)?,
        })
    }
}

impl SyncJobRepository for LibSqlSyncJobRepository<'_> {
    async fn create(&self, job: &SyncJob) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_jobs
                   (id, site_id, job_type, status, started_at, finished_at, error)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    job.id.as_str(),
                    job.site_id.as_str(),
                    job.job_type.as_str(),
                    job.status.as_str(),
                    job.started_at,
                    job.finished_at,
                    job.error.clone()
                ],
            )
            .await?;
        Ok(())
    }

    async fn finish(
        &self,
        id: &SyncJobId,
        status: SyncJobStatus,
        finished_at_ms: i64,
        error: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_jobs
                 SET status = ?, finished_at = ?, error = ?
                 WHERE id = ? AND status = 'RUNNING'",
                params![status.as_str(), finished_at_ms, error, id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &SyncJobId) -> Result<Option<SyncJob>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, site_id, job_type, status, started_at, finished_at, error
                 FROM sync_jobs WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_job(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_site(&self, site_id: &SiteId, limit: usize) -> Result<Vec<SyncJob>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, site_id, job_type, status, started_at, finished_at, error
                 FROM sync_jobs
                 WHERE site_id = ?
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?",
                params![site_id.as_str(), limit as i64],
            )
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(Self::parse_job(&row)?);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, LibSqlSiteRepository, SiteRepository};
    use crate::models::{Site, SyncJobType};

    async fn setup_site(db: &Database) -> SiteId {
        let site = Site::new("Test", "test");
        LibSqlSiteRepository::new(db.connection())
            .create(&site)
            .await
            .unwrap();
        site.id
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_then_finish_success() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlSyncJobRepository::new(db.connection());

        let job = SyncJob::running(site_id, SyncJobType::Full);
        repo.create(&job).await.unwrap();

        repo.finish(&job.id, SyncJobStatus::Succeeded, 2000, None)
            .await
            .unwrap();

        let loaded = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SyncJobStatus::Succeeded);
        assert_eq!(loaded.finished_at, Some(2000));
        assert_eq!(loaded.error, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_terminal_state_is_set_exactly_once() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlSyncJobRepository::new(db.connection());

        let job = SyncJob::running(site_id, SyncJobType::Poll);
        repo.create(&job).await.unwrap();

        repo.finish(&job.id, SyncJobStatus::Failed, 2000, Some("boom"))
            .await
            .unwrap();
        // A second terminal update must not overwrite the first
        repo.finish(&job.id, SyncJobStatus::Succeeded, 3000, None)
            .await
            .unwrap();

        let loaded = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SyncJobStatus::Failed);
        assert_eq!(loaded.finished_at, Some(2000));
        assert_eq!(loaded.error.as_deref(), Some("boom"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_for_site_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlSyncJobRepository::new(db.connection());

        let mut first = SyncJob::running(site_id, SyncJobType::Full);
        first.started_at = 1000;
        let mut second = SyncJob::running(site_id, SyncJobType::Poll);
        second.started_at = 2000;
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        let jobs = repo.list_for_site(&site_id, 10).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, second.id);

        let limited = repo.list_for_site(&site_id, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
