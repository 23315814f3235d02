//! Remote node repository

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{RemoteNode, SiteId};

/// Trait for mirrored wiki node storage operations (async)
#[allow(async_fn_in_trait)]
pub trait NodeRepository {
    /// Create or update a node by its `(site_id, node_token)` key
    async fn upsert(&self, node: &RemoteNode) -> Result<()>;

    /// Get a node by its `(site_id, node_token)` key
    async fn get(&self, site_id: &SiteId, node_token: &str) -> Result<Option<RemoteNode>>;

    /// Count mirrored nodes for a site
    async fn count(&self, site_id: &SiteId) -> Result<usize>;
}

/// libSQL implementation of `NodeRepository`
pub struct LibSqlNodeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlNodeRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_node(row: &libsql::Row) -> Result<RemoteNode> {
        let site_id: String = row.get(0)?;
        Ok(RemoteNode {
            site_id: site_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid site id: {site_id}")))?,
            node_token: row.get(1)?,
            parent_node_token: row.get(2)?,
            title: row.get(3)?,
            obj_type: row.get(4)?,
            obj_token: row.get(5)?,
            obj_edit_time_ms: row.get(6)?,
        })
    }
}

impl NodeRepository for LibSqlNodeRepository<'_> {
    async fn upsert(&self, node: &RemoteNode) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO remote_nodes
                   (site_id, node_token, parent_node_token, title,
                    obj_type, obj_token, obj_edit_time_ms)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (site_id, node_token) DO UPDATE SET
                   parent_node_token = excluded.parent_node_token,
                   title = excluded.title,
                   obj_type = excluded.obj_type,
                   obj_token = excluded.obj_token,
                   obj_edit_time_ms = excluded.obj_edit_time_ms",
                params![
                    node.site_id.as_str(),
                    node.node_token.clone(),
                    node.parent_node_token.clone(),
                    node.title.clone(),
                    node.obj_type.clone(),
                    node.obj_token.clone(),
                    node.obj_edit_time_ms
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, site_id: &SiteId, node_token: &str) -> Result<Option<RemoteNode>> {
        let mut rows = self
            .conn
            .query(
                "SELECT site_id, node_token, parent_node_token, title,
                        obj_type, obj_token, obj_edit_time_ms
                 FROM remote_nodes
                 WHERE site_id = ? AND node_token = ?",
                params![site_id.as_str(), node_token],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn count(&self, site_id: &SiteId) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM remote_nodes WHERE site_id = ?",
                [site_id.as_str()],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, LibSqlSiteRepository, SiteRepository};
    use crate::models::Site;

    async fn setup_site(db: &Database) -> SiteId {
        let site = Site::new("Test", "test");
        LibSqlSiteRepository::new(db.connection())
            .create(&site)
            .await
            .unwrap();
        site.id
    }

    fn node(site_id: SiteId, token: &str, edit_ms: Option<i64>) -> RemoteNode {
        RemoteNode {
            site_id,
            node_token: token.to_string(),
            parent_node_token: None,
            title: "Title".to_string(),
            obj_type: "docx".to_string(),
            obj_token: format!("obj-{token}"),
            obj_edit_time_ms: edit_ms,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_creates_then_updates() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlNodeRepository::new(db.connection());

        repo.upsert(&node(site_id, "n1", None)).await.unwrap();
        assert_eq!(repo.count(&site_id).await.unwrap(), 1);

        let mut updated = node(site_id, "n1", Some(99));
        updated.title = "Renamed".to_string();
        repo.upsert(&updated).await.unwrap();

        assert_eq!(repo.count(&site_id).await.unwrap(), 1);
        let loaded = repo.get(&site_id, "n1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Renamed");
        assert_eq!(loaded.obj_edit_time_ms, Some(99));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlNodeRepository::new(db.connection());

        assert!(repo.get(&site_id, "absent").await.unwrap().is_none());
    }
}
