//! Site and space-binding repositories

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Site, SiteId, SpaceBinding};

/// Trait for site storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SiteRepository {
    /// Insert a new site
    async fn create(&self, site: &Site) -> Result<()>;

    /// Get a site by id
    async fn get(&self, id: &SiteId) -> Result<Option<Site>>;

    /// Get a site by its slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Site>>;
}

/// Trait for space-binding storage operations (async)
#[allow(async_fn_in_trait)]
pub trait BindingRepository {
    /// Create or replace the binding for a site
    async fn upsert(&self, binding: &SpaceBinding) -> Result<()>;

    /// Get the binding for a site
    async fn get(&self, site_id: &SiteId) -> Result<Option<SpaceBinding>>;

    /// List bindings with scheduled polling enabled
    async fn list_sync_enabled(&self) -> Result<Vec<SpaceBinding>>;

    /// Record a successful full sync at the given time (Unix ms)
    async fn stamp_full_sync(&self, site_id: &SiteId, at_ms: i64) -> Result<()>;

    /// Record a successful poll sync at the given time (Unix ms)
    async fn stamp_poll_sync(&self, site_id: &SiteId, at_ms: i64) -> Result<()>;
}

/// libSQL implementation of `SiteRepository`
pub struct LibSqlSiteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSiteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_site(row: &libsql::Row) -> Result<Site> {
        let id: String = row.get(0)?;
        Ok(Site {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid site id: {id}")))?,
            name: row.get(1)?,
            slug: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl SiteRepository for LibSqlSiteRepository<'_> {
    async fn create(&self, site: &Site) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sites (id, name, slug, created_at) VALUES (?, ?, ?, ?)",
                params![
                    site.id.as_str(),
                    site.name.clone(),
                    site.slug.clone(),
                    site.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &SiteId) -> Result<Option<Site>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, slug, created_at FROM sites WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_site(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Site>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, slug, created_at FROM sites WHERE slug = ?",
                [slug],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_site(&row)?)),
            None => Ok(None),
        }
    }
}

/// libSQL implementation of `BindingRepository`
pub struct LibSqlBindingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlBindingRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_binding(row: &libsql::Row) -> Result<SpaceBinding> {
        let site_id: String = row.get(0)?;
        Ok(SpaceBinding {
            site_id: site_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid site id: {site_id}")))?,
            space_id: row.get(1)?,
            root_node_token: row.get(2)?,
            bound_by: row.get(3)?,
            sync_enabled: row.get::<i32>(4)? != 0,
            last_full_sync_at: row.get(5)?,
            last_poll_sync_at: row.get(6)?,
        })
    }
}

const BINDING_COLUMNS: &str = "site_id, space_id, root_node_token, bound_by, \
     sync_enabled, last_full_sync_at, last_poll_sync_at";

impl BindingRepository for LibSqlBindingRepository<'_> {
    async fn upsert(&self, binding: &SpaceBinding) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO space_bindings
                   (site_id, space_id, root_node_token, bound_by, sync_enabled,
                    last_full_sync_at, last_poll_sync_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (site_id) DO UPDATE SET
                   space_id = excluded.space_id,
                   root_node_token = excluded.root_node_token,
                   bound_by = excluded.bound_by,
                   sync_enabled = excluded.sync_enabled",
                params![
                    binding.site_id.as_str(),
                    binding.space_id.clone(),
                    binding.root_node_token.clone(),
                    binding.bound_by.clone(),
                    i32::from(binding.sync_enabled),
                    binding.last_full_sync_at,
                    binding.last_poll_sync_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, site_id: &SiteId) -> Result<Option<SpaceBinding>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {BINDING_COLUMNS} FROM space_bindings WHERE site_id = ?"),
                [site_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_binding(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_sync_enabled(&self) -> Result<Vec<SpaceBinding>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {BINDING_COLUMNS} FROM space_bindings WHERE sync_enabled = 1"),
                (),
            )
            .await?;

        let mut bindings = Vec::new();
        while let Some(row) = rows.next().await? {
            bindings.push(Self::parse_binding(&row)?);
        }
        Ok(bindings)
    }

    async fn stamp_full_sync(&self, site_id: &SiteId, at_ms: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE space_bindings SET last_full_sync_at = ? WHERE site_id = ?",
                params![at_ms, site_id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn stamp_poll_sync(&self, site_id: &SiteId, at_ms: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE space_bindings SET last_poll_sync_at = ? WHERE site_id = ?",
                params![at_ms, site_id.as_str()],
            )
            .await?;
        Ok(())
    }
}
