//! Database layer for wisp

mod connection;
mod job_repository;
mod migrations;
mod node_repository;
mod page_repository;
mod revision_repository;
mod site_repository;

pub use connection::Database;
pub use job_repository::{LibSqlSyncJobRepository, SyncJobRepository};
pub use node_repository::{LibSqlNodeRepository, NodeRepository};
pub use page_repository::{LibSqlPageRepository, PageRepository};
pub use revision_repository::{LibSqlRevisionRepository, RevisionRepository};
pub use site_repository::{
    BindingRepository, LibSqlBindingRepository, LibSqlSiteRepository, SiteRepository,
};
