//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: Initial schema
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    // inside one transaction for atomicity

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Sites
        "CREATE TABLE IF NOT EXISTS sites (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        )",
        // Space bindings, 1:1 with sites
        "CREATE TABLE IF NOT EXISTS space_bindings (
            site_id TEXT PRIMARY KEY REFERENCES sites(id) ON DELETE CASCADE,
            space_id TEXT NOT NULL,
            root_node_token TEXT,
            bound_by TEXT NOT NULL,
            sync_enabled INTEGER NOT NULL DEFAULT 1,
            last_full_sync_at INTEGER,
            last_poll_sync_at INTEGER
        )",
        // Mirrored remote wiki nodes
        "CREATE TABLE IF NOT EXISTS remote_nodes (
            site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
            node_token TEXT NOT NULL,
            parent_node_token TEXT,
            title TEXT NOT NULL,
            obj_type TEXT NOT NULL,
            obj_token TEXT NOT NULL,
            obj_edit_time_ms INTEGER,
            PRIMARY KEY (site_id, node_token)
        )",
        "CREATE INDEX IF NOT EXISTS idx_remote_nodes_parent
            ON remote_nodes(site_id, parent_node_token)",
        // Pages
        "CREATE TABLE IF NOT EXISTS pages (
            id TEXT PRIMARY KEY,
            site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
            node_token TEXT NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            nav_visible INTEGER NOT NULL DEFAULT 1,
            sort INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            UNIQUE (site_id, node_token),
            UNIQUE (site_id, slug)
        )",
        "CREATE INDEX IF NOT EXISTS idx_pages_status ON pages(site_id, status)",
        // Revisions, append-only
        "CREATE TABLE IF NOT EXISTS revisions (
            id TEXT PRIMARY KEY,
            page_id TEXT NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
            source_obj_type TEXT NOT NULL,
            source_obj_token TEXT NOT NULL,
            source_edit_time_ms INTEGER,
            content_hash TEXT NOT NULL,
            html TEXT NOT NULL,
            toc_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_revisions_page
            ON revisions(page_id, created_at DESC)",
        // Sync job run records
        "CREATE TABLE IF NOT EXISTS sync_jobs (
            id TEXT PRIMARY KEY,
            site_id TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
            job_type TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            finished_at INTEGER,
            error TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_jobs_site
            ON sync_jobs(site_id, started_at DESC)",
    ];

    for statement in statements {
        conn.execute(statement, ()).await?;
    }

    conn.execute(
        "INSERT OR REPLACE INTO schema_version (version) VALUES (?)",
        [CURRENT_VERSION],
    )
    .await?;

    conn.execute("COMMIT", ()).await?;
    Ok(())
}
