//! Wisp CLI - mirror a remote wiki space into a publishable local site
//!
//! Operator surface for sites, bindings, pages and sync runs, plus the
//! long-running worker loop.

mod worker;

use std::env;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use wisp_core::auth::{CredentialProvider, StaticCredentialProvider};
use wisp_core::db::{
    BindingRepository, Database, LibSqlBindingRepository, LibSqlPageRepository,
    LibSqlSiteRepository, LibSqlSyncJobRepository, PageRepository, SiteRepository,
    SyncJobRepository,
};
use wisp_core::models::{PageStatus, SpaceBinding};
use wisp_core::remote::RemoteClient;
use wisp_core::{slug, Config, Site, SyncEngine};

#[derive(Parser)]
#[command(name = "wisp")]
#[command(about = "Mirror a remote wiki space into a publishable local site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new site
    Create {
        /// Display name of the site
        name: String,
        /// URL slug (derived from the name when omitted)
        #[arg(long)]
        slug: Option<String>,
    },
    /// List remote wiki spaces available for binding
    Spaces,
    /// Bind a site to a remote wiki space
    Bind {
        /// Site slug
        site: String,
        /// Remote space id
        #[arg(long)]
        space: String,
        /// Root node token to scope the walk (space root when omitted)
        #[arg(long)]
        root: Option<String>,
        /// Identity owning the credential used for sync
        #[arg(long = "by")]
        bound_by: String,
        /// Exclude this site from scheduled polling
        #[arg(long)]
        no_schedule: bool,
    },
    /// Run a synchronization pass now
    Sync {
        /// Site slug
        site: String,
        #[arg(long, value_enum, default_value_t = SyncMode::Full)]
        mode: SyncMode,
    },
    /// List a site's pages
    Pages {
        /// Site slug
        site: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a page
    Publish {
        /// Site slug
        site: String,
        /// Page slug
        page: String,
    },
    /// Revert a page to draft
    Unpublish {
        /// Site slug
        site: String,
        /// Page slug
        page: String,
    },
    /// Re-render a page and store a revision if its content changed
    Refresh {
        /// Site slug
        site: String,
        /// Page slug
        page: String,
    },
    /// Show recent sync jobs for a site
    Jobs {
        /// Site slug
        site: String,
        /// Number of jobs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Run the scheduler and sync worker loop
    Worker,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum SyncMode {
    Full,
    Poll,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] wisp_core::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Site name cannot be empty")]
    EmptySiteName,
    #[error("Site name does not produce a usable slug; pass --slug")]
    UnusableSiteSlug,
    #[error("A site with slug '{0}' already exists")]
    DuplicateSiteSlug(String),
    #[error("Site not found: {0}")]
    SiteNotFound(String),
    #[error("Page not found: {0}")]
    PageNotFound(String),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wisp=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Create { name, slug } => run_create(&name, slug.as_deref(), &db_path).await?,
        Commands::Spaces => run_spaces().await?,
        Commands::Bind {
            site,
            space,
            root,
            bound_by,
            no_schedule,
        } => {
            run_bind(
                &site,
                &space,
                root.as_deref(),
                &bound_by,
                !no_schedule,
                &db_path,
            )
            .await?;
        }
        Commands::Sync { site, mode } => run_sync(&site, mode, &db_path).await?,
        Commands::Pages { site, json } => run_pages(&site, json, &db_path).await?,
        Commands::Publish { site, page } => {
            run_set_status(&site, &page, PageStatus::Published, &db_path).await?;
        }
        Commands::Unpublish { site, page } => {
            run_set_status(&site, &page, PageStatus::Draft, &db_path).await?;
        }
        Commands::Refresh { site, page } => run_refresh(&site, &page, &db_path).await?,
        Commands::Jobs { site, limit } => run_jobs(&site, limit, &db_path).await?,
        Commands::Worker => run_worker(&db_path).await?,
    }

    Ok(())
}

async fn run_create(name: &str, slug: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::EmptySiteName);
    }
    let site_slug = match slug {
        Some(explicit) => slug::sanitize(explicit),
        None => slug::sanitize(name),
    };
    if site_slug.is_empty() {
        return Err(CliError::UnusableSiteSlug);
    }

    let db = Database::open(db_path).await?;
    let sites = LibSqlSiteRepository::new(db.connection());
    if sites.find_by_slug(&site_slug).await?.is_some() {
        return Err(CliError::DuplicateSiteSlug(site_slug));
    }

    let site = Site::new(name, &site_slug);
    sites.create(&site).await?;
    println!("{site_slug}  {}", site.id);
    Ok(())
}

async fn run_spaces() -> Result<(), CliError> {
    let config = Config::from_env()?;
    let remote = RemoteClient::new(&config.remote_base_url)?;
    let provider = StaticCredentialProvider::new(config.access_token.unwrap_or_default());
    let credential = provider.valid_credential("cli").await?;

    for space in remote.list_spaces(&credential).await? {
        let description = space.description.as_deref().unwrap_or("");
        println!("{:<20}  {:<30}  {description}", space.space_id, space.name);
    }
    Ok(())
}

async fn run_bind(
    site_slug: &str,
    space_id: &str,
    root: Option<&str>,
    bound_by: &str,
    sync_enabled: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;

    let mut binding = match root {
        Some(root_token) => SpaceBinding::new(site.id, space_id, bound_by).with_root(root_token),
        None => SpaceBinding::new(site.id, space_id, bound_by),
    };
    binding.sync_enabled = sync_enabled;

    LibSqlBindingRepository::new(db.connection())
        .upsert(&binding)
        .await?;
    println!("{site_slug} bound to space {space_id}");
    Ok(())
}

async fn run_sync(site_slug: &str, mode: SyncMode, db_path: &Path) -> Result<(), CliError> {
    let config = Config::from_env()?;
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;

    let remote = RemoteClient::new(&config.remote_base_url)?;
    let provider = StaticCredentialProvider::new(config.access_token.unwrap_or_default());
    let engine = SyncEngine::new(&db, &remote, &provider);

    match mode {
        SyncMode::Full => engine.run_full(&site.id).await?,
        SyncMode::Poll => engine.run_poll(&site.id).await?,
    }
    println!("Sync completed");
    Ok(())
}

#[derive(Debug, Serialize)]
struct PageListItem {
    slug: String,
    title: String,
    status: String,
    nav_visible: bool,
    node_token: String,
    created_at: i64,
}

async fn run_pages(site_slug: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;
    let pages = LibSqlPageRepository::new(db.connection())
        .list(&site.id)
        .await?;

    if as_json {
        let items = pages
            .iter()
            .map(|page| PageListItem {
                slug: page.slug.clone(),
                title: page.title.clone(),
                status: page.status.to_string(),
                nav_visible: page.nav_visible,
                node_token: page.node_token.clone(),
                created_at: page.created_at,
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for page in &pages {
            println!("{:<30}  {:<10}  {}", page.slug, page.status, page.title);
        }
    }
    Ok(())
}

async fn run_set_status(
    site_slug: &str,
    page_slug: &str,
    status: PageStatus,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;
    let pages = LibSqlPageRepository::new(db.connection());
    let page = pages
        .find_by_slug(&site.id, page_slug)
        .await?
        .ok_or_else(|| CliError::PageNotFound(page_slug.to_string()))?;

    pages.set_status(&page.id, status).await?;
    println!("{page_slug} is now {status}");
    Ok(())
}

async fn run_refresh(site_slug: &str, page_slug: &str, db_path: &Path) -> Result<(), CliError> {
    let config = Config::from_env()?;
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;
    let page = LibSqlPageRepository::new(db.connection())
        .find_by_slug(&site.id, page_slug)
        .await?
        .ok_or_else(|| CliError::PageNotFound(page_slug.to_string()))?;

    let remote = RemoteClient::new(&config.remote_base_url)?;
    let provider = StaticCredentialProvider::new(config.access_token.unwrap_or_default());
    let engine = SyncEngine::new(&db, &remote, &provider);

    if engine.refresh_page_revision(&page.id, None).await? {
        println!("New revision stored for {page_slug}");
    } else {
        println!("{page_slug} unchanged");
    }
    Ok(())
}

async fn run_jobs(site_slug: &str, limit: usize, db_path: &Path) -> Result<(), CliError> {
    let db = Database::open(db_path).await?;
    let site = resolve_site(&db, site_slug).await?;
    let jobs = LibSqlSyncJobRepository::new(db.connection())
        .list_for_site(&site.id, limit)
        .await?;

    for job in &jobs {
        let error = job.error.as_deref().unwrap_or("");
        println!(
            "{:<5}  {:<10}  {}  {error}",
            job.job_type,
            job.status,
            format_time(job.started_at)
        );
    }
    Ok(())
}

async fn run_worker(db_path: &Path) -> Result<(), CliError> {
    let mut config = Config::from_env()?;
    config.database_path = db_path.to_string_lossy().to_string();
    worker::run(&config).await?;
    Ok(())
}

async fn resolve_site(db: &Database, site_slug: &str) -> Result<Site, CliError> {
    LibSqlSiteRepository::new(db.connection())
        .find_by_slug(site_slug)
        .await?
        .ok_or_else(|| CliError::SiteNotFound(site_slug.to_string()))
}

fn format_time(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |time| time.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("WISP_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("wisp.db"))
}
