//! Data models for wisp

mod ids;
mod node;
mod page;
mod revision;
mod site;
mod sync_job;

pub use ids::{PageId, RevisionId, SiteId, SyncJobId};
pub use node::{parse_edit_time_ms, RemoteNode};
pub use page::{Page, PageStatus};
pub use revision::{Revision, TocEntry};
pub use site::{Site, SpaceBinding};
pub use sync_job::{SyncJob, SyncJobStatus, SyncJobType};
