//! Page repository

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Page, PageId, PageStatus, SiteId};

/// Trait for page storage operations (async)
#[allow(async_fn_in_trait)]
pub trait PageRepository {
    /// Insert a new page
    async fn create(&self, page: &Page) -> Result<()>;

    /// Get a page by id
    async fn get(&self, id: &PageId) -> Result<Option<Page>>;

    /// Find the page bound to a wiki node
    async fn find_by_node(&self, site_id: &SiteId, node_token: &str) -> Result<Option<Page>>;

    /// Find a page by its per-site slug
    async fn find_by_slug(&self, site_id: &SiteId, slug: &str) -> Result<Option<Page>>;

    /// Refresh the upstream title only; owner-editable fields are untouched
    async fn update_title(&self, id: &PageId, title: &str) -> Result<()>;

    /// Set the publishing status (operator surface)
    async fn set_status(&self, id: &PageId, status: PageStatus) -> Result<()>;

    /// List all pages of a site, navigation order
    async fn list(&self, site_id: &SiteId) -> Result<Vec<Page>>;

    /// List published pages of a site
    async fn list_published(&self, site_id: &SiteId) -> Result<Vec<Page>>;
}

/// libSQL implementation of `PageRepository`
pub struct LibSqlPageRepository<'a> {
    conn: &'a Connection,
}

const PAGE_COLUMNS: &str =
    "id, site_id, node_token, title, slug, status, nav_visible, sort, created_at";

impl<'a> LibSqlPageRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_page(row: &libsql::Row) -> Result<Page> {
        let id: String = row.get(0)?;
        let site_id: String = row.get(1)?;
        let status: String = row.get(5)?;
        Ok(Page {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid page id: {id}")))?,
            site_id: site_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid site id: {site_id}")))?,
            node_token: row.get(2)?,
            title: row.get(3)?,
            slug: row.get(4)?,
            status: status.parse().map_err(Error::Database)?,
            nav_visible: row.get::<i32>(6)? != 0,
            sort: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    async fn query_one(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Option<Page>> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_page(&row)?)),
            None => Ok(None),
        }
    }

    async fn query_many(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Page>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next().await? {
            pages.push(Self::parse_page(&row)?);
        }
        Ok(pages)
    }
}

impl PageRepository for LibSqlPageRepository<'_> {
    async fn create(&self, page: &Page) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO pages
                   (id, site_id, node_token, title, slug, status, nav_visible, sort, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    page.id.as_str(),
                    page.site_id.as_str(),
                    page.node_token.clone(),
                    page.title.clone(),
                    page.slug.clone(),
                    page.status.as_str(),
                    i32::from(page.nav_visible),
                    page.sort,
                    page.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &PageId) -> Result<Option<Page>> {
        self.query_one(
            &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?"),
            [id.as_str()],
        )
        .await
    }

    async fn find_by_node(&self, site_id: &SiteId, node_token: &str) -> Result<Option<Page>> {
        self.query_one(
            &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE site_id = ? AND node_token = ?"),
            params![site_id.as_str(), node_token],
        )
        .await
    }

    async fn find_by_slug(&self, site_id: &SiteId, slug: &str) -> Result<Option<Page>> {
        self.query_one(
            &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE site_id = ? AND slug = ?"),
            params![site_id.as_str(), slug],
        )
        .await
    }

    async fn update_title(&self, id: &PageId, title: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE pages SET title = ? WHERE id = ?",
                params![title, id.as_str()],
            )
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("page {id}")));
        }
        Ok(())
    }

    async fn set_status(&self, id: &PageId, status: PageStatus) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE pages SET status = ? WHERE id = ?",
                params![status.as_str(), id.as_str()],
            )
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("page {id}")));
        }
        Ok(())
    }

    async fn list(&self, site_id: &SiteId) -> Result<Vec<Page>> {
        self.query_many(
            &format!(
                "SELECT {PAGE_COLUMNS} FROM pages
                 WHERE site_id = ?
                 ORDER BY sort ASC, created_at ASC"
            ),
            [site_id.as_str()],
        )
        .await
    }

    async fn list_published(&self, site_id: &SiteId) -> Result<Vec<Page>> {
        self.query_many(
            &format!(
                "SELECT {PAGE_COLUMNS} FROM pages
                 WHERE site_id = ? AND status = 'PUBLISHED'
                 ORDER BY sort ASC, created_at ASC"
            ),
            [site_id.as_str()],
        )
        .await
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

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_lookup() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlPageRepository::new(db.connection());

        let page = Page::new_draft(site_id, "n1", "Guide", "guide");
        repo.create(&page).await.unwrap();

        assert_eq!(repo.get(&page.id).await.unwrap().unwrap(), page);
        assert_eq!(
            repo.find_by_node(&site_id, "n1").await.unwrap().unwrap().id,
            page.id
        );
        assert_eq!(
            repo.find_by_slug(&site_id, "guide")
                .await
                .unwrap()
                .unwrap()
                .id,
            page.id
        );
        assert!(repo.find_by_slug(&site_id, "other").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicate_slug_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlPageRepository::new(db.connection());

        repo.create(&Page::new_draft(site_id, "n1", "Guide", "guide"))
            .await
            .unwrap();
        let duplicate = Page::new_draft(site_id, "n2", "Guide", "guide");
        assert!(repo.create(&duplicate).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_title_keeps_operator_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlPageRepository::new(db.connection());

        let page = Page::new_draft(site_id, "n1", "Old", "old");
        repo.create(&page).await.unwrap();
        repo.set_status(&page.id, PageStatus::Published).await.unwrap();

        repo.update_title(&page.id, "New").await.unwrap();

        let loaded = repo.get(&page.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "New");
        assert_eq!(loaded.slug, "old");
        assert_eq!(loaded.status, PageStatus::Published);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_published_filters_drafts() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_site(&db).await;
        let repo = LibSqlPageRepository::new(db.connection());

        let draft = Page::new_draft(site_id, "n1", "Draft", "draft");
        let published = Page::new_draft(site_id, "n2", "Live", "live");
        repo.create(&draft).await.unwrap();
        repo.create(&published).await.unwrap();
        repo.set_status(&published.id, PageStatus::Published)
            .await
            .unwrap();

        let live = repo.list_published(&site_id).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, published.id);

        assert_eq!(repo.list(&site_id).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_missing_page_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        setup_site(&db).await;
        let repo = LibSqlPageRepository::new(db.connection());

        let missing = PageId::new();
        assert!(matches!(
            repo.update_title(&missing, "x").await,
            Err(Error::NotFound(_))
        ));
    }
}
