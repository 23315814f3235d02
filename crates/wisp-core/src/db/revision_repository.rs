//! Revision repository

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{PageId, Revision, TocEntry};

/// Trait for revision storage operations (async).
///
/// Revisions are append-only; there is no update path.
#[allow(async_fn_in_trait)]
pub trait RevisionRepository {
    /// Append a new revision row
    async fn append(&self, revision: &Revision) -> Result<()>;

    /// Get the most recent revision for a page
    async fn latest(&self, page_id: &PageId) -> Result<Option<Revision>>;

    /// Count revisions for a page
    async fn count(&self, page_id: &PageId) -> Result<usize>;
}

/// libSQL implementation of `RevisionRepository`
pub struct LibSqlRevisionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlRevisionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_revision(row: &libsql::Row) -> Result<Revision> {
        let id: String = row.get(0)?;
        let page_id: String = row.get(1)?;
        let toc_json: String = row.get(7)?;
        let toc: Vec<TocEntry> = serde_json::from_str(&toc_json)?;
        Ok(Revision {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid revision id: {id}")))?,
            page_id: page_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid page id: {page_id}")))?,
            source_obj_type: row.get(2)?,
            source_obj_token: row.get(3)?,
            source_edit_time_ms: row.get(4)?,
            content_hash: row.get(5)?,
            html: row.get(6)?,
            toc,
            created_at: row.get(8)?,
        })
    }
}

impl RevisionRepository for LibSqlRevisionRepository<'_> {
    async fn append(&self, revision: &Revision) -> Result<()> {
        let toc_json = serde_json::to_string(&revision.toc)?;
        self.conn
            .execute(
                "INSERT INTO revisions
                   (id, page_id, source_obj_type, source_obj_token, source_edit_time_ms,
                    content_hash, html, toc_json, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    revision.id.as_str(),
                    revision.page_id.as_str(),
                    revision.source_obj_type.clone(),
                    revision.source_obj_token.clone(),
                    revision.source_edit_time_ms,
                    revision.content_hash.clone(),
                    revision.html.clone(),
                    toc_json,
                    revision.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn latest(&self, page_id: &PageId) -> Result<Option<Revision>> {
        // v7 ids are time-ordered, breaking created_at ties from fast appends
        let mut rows = self
            .conn
            .query(
                "SELECT id, page_id, source_obj_type, source_obj_token, source_edit_time_ms,
                        content_hash, html, toc_json, created_at
                 FROM revisions
                 WHERE page_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                [page_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_revision(&row)?)),
            None => Ok(None),
        }
    }

    async fn count(&self, page_id: &PageId) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM revisions WHERE page_id = ?",
                [page_id.as_str()],
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
    use crate::db::{
        Database, LibSqlPageRepository, LibSqlSiteRepository, PageRepository, SiteRepository,
    };
    use crate::models::{Page, Site};

    async fn setup_page(db: &Database) -> PageId {
        let site = Site::new("Test", "test");
        LibSqlSiteRepository::new(db.connection())
            .create(&site)
            .await
            .unwrap();
        let page = Page::new_draft(site.id, "n1", "Guide", "guide");
        LibSqlPageRepository::new(db.connection())
            .create(&page)
            .await
            .unwrap();
        page.id
    }

    fn revision(page_id: PageId, hash: &str) -> Revision {
        Revision::new(
            page_id,
            "docx",
            "obj-1",
            Some(1000),
            hash,
            "<p>hi</p>",
            vec![TocEntry {
                id: "hi".to_string(),
                level: 1,
                text: "Hi".to_string(),
            }],
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_append_and_latest() {
        let db = Database::open_in_memory().await.unwrap();
        let page_id = setup_page(&db).await;
        let repo = LibSqlRevisionRepository::new(db.connection());

        assert!(repo.latest(&page_id).await.unwrap().is_none());

        let first = revision(page_id, "aaa");
        let second = revision(page_id, "bbb");
        repo.append(&first).await.unwrap();
        repo.append(&second).await.unwrap();

        let latest = repo.latest(&page_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.content_hash, "bbb");
        assert_eq!(latest.toc, second.toc);
        assert_eq!(repo.count(&page_id).await.unwrap(), 2);
    }
}
