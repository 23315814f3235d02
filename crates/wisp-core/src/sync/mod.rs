//! Sync orchestration.
//!
//! Walks the bound remote tree breadth-first, mirrors nodes and pages into
//! the local store, and refreshes revisions of changed published pages.
//! Every run is wrapped in a persistent job record; failures are recorded
//! there before propagating so the queue layer sees both signals.

mod detect;
mod job;
mod revision;

pub use detect::is_changed;
pub use job::JobTracker;
pub use revision::{refresh_revision, RENDERABLE_OBJ_TYPE};

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::auth::{Credential, CredentialProvider};
use crate::db::{
    BindingRepository, Database, LibSqlBindingRepository, LibSqlNodeRepository,
    LibSqlPageRepository, LibSqlRevisionRepository, LibSqlSiteRepository, LibSqlSyncJobRepository,
    NodeRepository, PageRepository, SiteRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    parse_edit_time_ms, Page, PageId, RemoteNode, SiteId, SpaceBinding, SyncJobType,
};
use crate::remote::RemoteApi;
use crate::slug;

/// Visited-set key for the unnamed space root
const ROOT_SENTINEL: &str = "__root__";

/// Orchestrates sync runs for one store against one remote
pub struct SyncEngine<'a, R, C> {
    db: &'a Database,
    remote: &'a R,
    credentials: &'a C,
}

impl<'a, R: RemoteApi, C: CredentialProvider> SyncEngine<'a, R, C> {
    pub const fn new(db: &'a Database, remote: &'a R, credentials: &'a C) -> Self {
        Self {
            db,
            remote,
            credentials,
        }
    }

    /// Re-walk the whole bound tree, creating and refreshing node and page
    /// records. Fails if the site is missing or has no binding.
    pub async fn run_full(&self, site_id: &SiteId) -> Result<()> {
        let conn = self.db.connection();
        let sites = LibSqlSiteRepository::new(conn);
        let bindings = LibSqlBindingRepository::new(conn);
        let jobs = LibSqlSyncJobRepository::new(conn);

        let site = sites
            .get(site_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("site {site_id}")))?;
        let binding = bindings
            .get(site_id)
            .await?
            .ok_or_else(|| Error::Unbound(format!("site {site_id} has no space binding")))?;

        let tracker = JobTracker::new(&jobs);
        let run = tracker.start(site.id, SyncJobType::Full).await?;
        info!(site = %site.slug, job = %run.id, "full sync started");

        match self.full_pass(&binding).await {
            Ok(()) => {
                bindings.stamp_full_sync(site_id, job::now_ms()).await?;
                tracker.succeed(&run.id).await?;
                info!(site = %site.slug, job = %run.id, "full sync succeeded");
                Ok(())
            }
            Err(err) => {
                // The walk error is what the caller must see; a failed
                // bookkeeping write must not shadow it.
                if let Err(record_err) = tracker.fail(&run.id, &err.to_string()).await {
                    warn!(job = %run.id, error = %record_err, "recording job failure failed");
                }
                Err(err)
            }
        }
    }

    /// Incremental walk: diff each node against the stored state, then
    /// refresh revisions of published pages whose backing node changed.
    /// Silently no-ops for unbound sites, since polls are scheduled
    /// unconditionally.
    pub async fn run_poll(&self, site_id: &SiteId) -> Result<()> {
        let conn = self.db.connection();
        let sites = LibSqlSiteRepository::new(conn);
        let bindings = LibSqlBindingRepository::new(conn);
        let jobs = LibSqlSyncJobRepository::new(conn);

        let site = sites
            .get(site_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("site {site_id}")))?;
        let Some(binding) = bindings.get(site_id).await? else {
            debug!(site = %site.slug, "poll skipped, site not bound");
            return Ok(());
        };

        let tracker = JobTracker::new(&jobs);
        let run = tracker.start(site.id, SyncJobType::Poll).await?;

        match self.poll_pass(&binding).await {
            Ok(refreshed) => {
                bindings.stamp_poll_sync(site_id, job::now_ms()).await?;
                tracker.succeed(&run.id).await?;
                info!(site = %site.slug, job = %run.id, refreshed, "poll sync succeeded");
                Ok(())
            }
            Err(err) => {
                if let Err(record_err) = tracker.fail(&run.id, &err.to_string()).await {
                    warn!(job = %run.id, error = %record_err, "recording job failure failed");
                }
                Err(err)
            }
        }
    }

    async fn full_pass(&self, binding: &SpaceBinding) -> Result<()> {
        let credential = self.credentials.valid_credential(&binding.bound_by).await?;
        self.walk_tree(binding, &credential, false).await?;
        Ok(())
    }

    async fn poll_pass(&self, binding: &SpaceBinding) -> Result<usize> {
        let credential = self.credentials.valid_credential(&binding.bound_by).await?;
        let changed = self.walk_tree(binding, &credential, true).await?;

        let conn = self.db.connection();
        let pages = LibSqlPageRepository::new(conn);
        let nodes = LibSqlNodeRepository::new(conn);
        let revisions = LibSqlRevisionRepository::new(conn);

        let mut refreshed = 0;
        for page in pages.list_published(&binding.site_id).await? {
            if !changed.contains(&page.node_token) {
                continue;
            }
            let node = nodes
                .get(&page.site_id, &page.node_token)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no mirrored node for page {}", page.id)))?;
            if refresh_revision(self.remote, &revisions, &node, page.id, &credential).await? {
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    /// Breadth-first traversal of the remote tree.
    ///
    /// The work queue holds "list children of" tasks; a visited set over
    /// parent keys keeps each parent fetched at most once, which also bounds
    /// loops from a misbehaving remote. Returns the node tokens flagged by
    /// the change detector when `detect` is set.
    async fn walk_tree(
        &self,
        binding: &SpaceBinding,
        credential: &Credential,
        detect: bool,
    ) -> Result<HashSet<String>> {
        let conn = self.db.connection();
        let nodes = LibSqlNodeRepository::new(conn);
        let pages = LibSqlPageRepository::new(conn);

        let mut changed = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Option<String>> = VecDeque::new();
        queue.push_back(binding.root_node_token.clone());

        while let Some(parent) = queue.pop_front() {
            let key = parent.clone().unwrap_or_else(|| ROOT_SENTINEL.to_string());
            if !visited.insert(key) {
                continue;
            }

            let items = self
                .remote
                .list_nodes(credential, &binding.space_id, parent.as_deref())
                .await?;

            for item in items {
                let incoming = RemoteNode {
                    site_id: binding.site_id,
                    node_token: item.node_token.clone(),
                    parent_node_token: item.parent_node_token.clone().or_else(|| parent.clone()),
                    title: item.title.clone(),
                    obj_type: item.obj_type.clone(),
                    obj_token: item.obj_token.clone(),
                    obj_edit_time_ms: parse_edit_time_ms(item.obj_edit_time.as_deref()),
                };

                if detect {
                    let existing = nodes.get(&binding.site_id, &incoming.node_token).await?;
                    if is_changed(existing.as_ref(), &incoming) {
                        changed.insert(incoming.node_token.clone());
                    }
                }

                nodes.upsert(&incoming).await?;
                self.ensure_page(&pages, &incoming).await?;

                if item.has_child {
                    queue.push_back(Some(item.node_token));
                }
            }
        }

        Ok(changed)
    }

    /// Create the page for a freshly discovered node, or refresh its title.
    /// Slug, status, visibility and ordering stay with the operator.
    async fn ensure_page(
        &self,
        pages: &LibSqlPageRepository<'_>,
        node: &RemoteNode,
    ) -> Result<()> {
        match pages.find_by_node(&node.site_id, &node.node_token).await? {
            None => {
                let desired = slug::page_slug(&node.title, &node.node_token);
                let allocated = slug::allocate_unique(pages, &node.site_id, &desired).await?;
                let page = Page::new_draft(node.site_id, &node.node_token, &node.title, allocated);
                pages.create(&page).await?;
                debug!(slug = %page.slug, "page created");
            }
            Some(page) if page.title != node.title => {
                pages.update_title(&page.id, &node.title).await?;
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Render the page's current content and append a revision if changed.
    ///
    /// When no credential is supplied, one is obtained through the binding's
    /// owning identity. Returns whether a revision row was written.
    pub async fn refresh_page_revision(
        &self,
        page_id: &PageId,
        credential: Option<&Credential>,
    ) -> Result<bool> {
        let conn = self.db.connection();
        let pages = LibSqlPageRepository::new(conn);
        let nodes = LibSqlNodeRepository::new(conn);
        let bindings = LibSqlBindingRepository::new(conn);
        let revisions = LibSqlRevisionRepository::new(conn);

        let page = pages
            .get(page_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("page {page_id}")))?;
        let node = nodes
            .get(&page.site_id, &page.node_token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no mirrored node for page {page_id}")))?;

        let owned;
        let credential = match credential {
            Some(credential) => credential,
            None => {
                let binding = bindings.get(&page.site_id).await?.ok_or_else(|| {
                    Error::Unbound(format!("site {} has no space binding", page.site_id))
                })?;
                owned = self.credentials.valid_credential(&binding.bound_by).await?;
                &owned
            }
        };

        refresh_revision(self.remote, &revisions, &node, page.id, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentialProvider;
    use crate::db::{RevisionRepository, SyncJobRepository};
    use crate::models::{PageStatus, Site, SyncJobStatus};
    use crate::remote::NodeItem;
    use crate::render::{Block, BlockKind, Span};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeRemote {
        nodes_by_parent: HashMap<String, Vec<NodeItem>>,
        blocks_by_doc: HashMap<String, Vec<Block>>,
        fail_on_parent: Option<String>,
        listed_parents: Mutex<Vec<String>>,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                nodes_by_parent: HashMap::new(),
                blocks_by_doc: HashMap::new(),
                fail_on_parent: None,
                listed_parents: Mutex::new(Vec::new()),
            }
        }

        fn with_nodes(mut self, parent: &str, items: Vec<NodeItem>) -> Self {
            self.nodes_by_parent.insert(parent.to_string(), items);
            self
        }

        fn with_blocks(mut self, doc: &str, blocks: Vec<Block>) -> Self {
            self.blocks_by_doc.insert(doc.to_string(), blocks);
            self
        }
    }

    impl RemoteApi for FakeRemote {
        async fn list_nodes(
            &self,
            _credential: &Credential,
            _space_id: &str,
            parent_node_token: Option<&str>,
        ) -> Result<Vec<NodeItem>> {
            let key = parent_node_token.unwrap_or(ROOT_SENTINEL).to_string();
            self.listed_parents.lock().unwrap().push(key.clone());
            if self.fail_on_parent.as_deref() == Some(key.as_str()) {
                return Err(Error::RemoteApi("listing exploded".to_string()));
            }
            Ok(self.nodes_by_parent.get(&key).cloned().unwrap_or_default())
        }

        async fn list_blocks(
            &self,
            _credential: &Credential,
            document_id: &str,
        ) -> Result<Vec<Block>> {
            Ok(self
                .blocks_by_doc
                .get(document_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn item(token: &str, title: &str, obj_token: &str, edit: &str, has_child: bool) -> NodeItem {
        NodeItem {
            node_token: token.to_string(),
            parent_node_token: None,
            title: title.to_string(),
            has_child,
            obj_type: "docx".to_string(),
            obj_token: obj_token.to_string(),
            obj_edit_time: Some(edit.to_string()),
        }
    }

    fn doc(text: &str) -> Vec<Block> {
        vec![
            Block::new("root", BlockKind::Page).children(&["p1"]),
            Block::with_spans("p1", BlockKind::Text, vec![Span::text(text)]).parent("root"),
        ]
    }

    async fn setup_bound_site(db: &Database) -> SiteId {
        let site = Site::new("Handbook", "handbook");
        LibSqlSiteRepository::new(db.connection())
            .create(&site)
            .await
            .unwrap();
        LibSqlBindingRepository::new(db.connection())
            .upsert(&SpaceBinding::new(site.id, "space-1", "owner-1"))
            .await
            .unwrap();
        site.id
    }

    fn credentials() -> StaticCredentialProvider {
        StaticCredentialProvider::new("test-token")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_sync_mirrors_tree_and_creates_draft_pages() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;

        let remote = FakeRemote::new()
            .with_nodes(
                ROOT_SENTINEL,
                vec![item("n1", "Guide", "d1", "100", true)],
            )
            .with_nodes("n1", vec![item("n2", "Setup", "d2", "200", false)]);
        let provider = credentials();
        let engine = SyncEngine::new(&db, &remote, &provider);

        engine.run_full(&site_id).await.unwrap();

        let nodes = LibSqlNodeRepository::new(db.connection());
        assert_eq!(nodes.count(&site_id).await.unwrap(), 2);
        let child = nodes.get(&site_id, "n2").await.unwrap().unwrap();
        assert_eq!(child.parent_node_token.as_deref(), Some("n1"));
        assert_eq!(child.obj_edit_time_ms, Some(200));

        let pages = LibSqlPageRepository::new(db.connection());
        let all = pages.list(&site_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.status == PageStatus::Draft));
        assert!(pages.find_by_slug(&site_id, "guide").await.unwrap().is_some());

        let binding = LibSqlBindingRepository::new(db.connection())
            .get(&site_id)
            .await
            .unwrap()
            .unwrap();
        assert!(binding.last_full_sync_at.is_some());
        assert!(binding.last_poll_sync_at.is_none());

        let jobs = LibSqlSyncJobRepository::new(db.connection())
            .list_for_site(&site_id, 10)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Succeeded);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_traversal_visits_each_parent_once() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;

        // Both branches report the same node as a child with children of its
        // own, so "shared" is enqueued twice.
        let mut shared_a = item("shared", "Shared", "d3", "300", true);
        shared_a.parent_node_token = Some("a".to_string());
        let mut shared_b = item("shared", "Shared", "d3", "300", true);
        shared_b.parent_node_token = Some("b".to_string());

        let remote = FakeRemote::new()
            .with_nodes(
                ROOT_SENTINEL,
                vec![
                    item("a", "A", "d1", "100", true),
                    item("b", "B", "d2", "200", true),
                ],
            )
            .with_nodes("a", vec![shared_a])
            .with_nodes("b", vec![shared_b])
            .with_nodes("shared", vec![]);
        let provider = credentials();
        let engine = SyncEngine::new(&db, &remote, &provider);

        engine.run_full(&site_id).await.unwrap();

        let listed = remote.listed_parents.lock().unwrap().clone();
        assert_eq!(
            listed.iter().filter(|p| p.as_str() == "shared").count(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_sync_requires_binding_but_poll_skips() {
        let db = Database::open_in_memory().await.unwrap();
        let site = Site::new("Loose", "loose");
        LibSqlSiteRepository::new(db.connection())
            .create(&site)
            .await
            .unwrap();

        let remote = FakeRemote::new();
        let provider = credentials();
        let engine = SyncEngine::new(&db, &remote, &provider);

        assert!(matches!(
            engine.run_full(&site.id).await,
            Err(Error::Unbound(_))
        ));
        engine.run_poll(&site.id).await.unwrap();

        // No job rows for the skipped poll either
        let jobs = LibSqlSyncJobRepository::new(db.connection())
            .list_for_site(&site.id, 10)
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_site_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let remote = FakeRemote::new();
        let provider = credentials();
        let engine = SyncEngine::new(&db, &remote, &provider);

        assert!(matches!(
            engine.run_full(&SiteId::new()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_poll_refreshes_only_changed_published_pages() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "Guide", "d1", "100", false)])
            .with_blocks("d1", doc("v1"));
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_full(&site_id).await.unwrap();

        let pages = LibSqlPageRepository::new(db.connection());
        let page = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();
        pages
            .set_status(&page.id, PageStatus::Published)
            .await
            .unwrap();

        let revisions = LibSqlRevisionRepository::new(db.connection());

        // Unchanged node: poll writes no revision
        engine.run_poll(&site_id).await.unwrap();
        assert_eq!(revisions.count(&page.id).await.unwrap(), 0);

        // Edit time moved and content changed: exactly one new revision
        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "Guide", "d1", "200", false)])
            .with_blocks("d1", doc("v2"));
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_poll(&site_id).await.unwrap();
        assert_eq!(revisions.count(&page.id).await.unwrap(), 1);
        let latest = revisions.latest(&page.id).await.unwrap().unwrap();
        assert!(latest.html.contains("v2"));
        assert_eq!(latest.source_edit_time_ms, Some(200));

        // Same state again: still one revision
        engine.run_poll(&site_id).await.unwrap();
        assert_eq!(revisions.count(&page.id).await.unwrap(), 1);

        let binding = LibSqlBindingRepository::new(db.connection())
            .get(&site_id)
            .await
            .unwrap()
            .unwrap();
        assert!(binding.last_poll_sync_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_poll_ignores_changed_draft_pages() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "Guide", "d1", "100", false)])
            .with_blocks("d1", doc("v1"));
        let engine = SyncEngine::new(&db, &remote, &provider);
        // First poll discovers the node (absent stored state counts as
        // changed), but the page is still a draft.
        engine.run_poll(&site_id).await.unwrap();

        let pages = LibSqlPageRepository::new(db.connection());
        let page = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();
        let revisions = LibSqlRevisionRepository::new(db.connection());
        assert_eq!(revisions.count(&page.id).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_skips_when_hash_unchanged() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "Guide", "d1", "100", false)])
            .with_blocks("d1", doc("stable"));
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_full(&site_id).await.unwrap();

        let pages = LibSqlPageRepository::new(db.connection());
        let page = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();

        assert!(engine.refresh_page_revision(&page.id, None).await.unwrap());
        assert!(!engine.refresh_page_revision(&page.id, None).await.unwrap());

        let revisions = LibSqlRevisionRepository::new(db.connection());
        assert_eq!(revisions.count(&page.id).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_unsupported_type_writes_placeholder() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let mut sheet = item("n1", "Numbers", "s1", "100", false);
        sheet.obj_type = "sheet".to_string();
        let remote = FakeRemote::new().with_nodes(ROOT_SENTINEL, vec![sheet]);
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_full(&site_id).await.unwrap();

        let pages = LibSqlPageRepository::new(db.connection());
        let page = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();
        assert!(engine.refresh_page_revision(&page.id, None).await.unwrap());

        let revisions = LibSqlRevisionRepository::new(db.connection());
        let latest = revisions.latest(&page.id).await.unwrap().unwrap();
        assert!(latest.html.contains("Unsupported document type: sheet"));
        assert!(latest.toc.is_empty());
        assert_eq!(latest.source_obj_type, "sheet");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_missing_page_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        setup_bound_site(&db).await;
        let remote = FakeRemote::new();
        let provider = credentials();
        let engine = SyncEngine::new(&db, &remote, &provider);

        assert!(matches!(
            engine.refresh_page_revision(&PageId::new(), None).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_mid_traversal_marks_job_failed() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let mut remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("bad", "Bad", "d1", "100", true)]);
        remote.fail_on_parent = Some("bad".to_string());
        let engine = SyncEngine::new(&db, &remote, &provider);

        let err = engine.run_full(&site_id).await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi(_)));

        let jobs = LibSqlSyncJobRepository::new(db.connection())
            .list_for_site(&site_id, 10)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Failed);
        assert!(jobs[0].finished_at.is_some());
        let recorded = jobs[0].error.as_deref().unwrap();
        assert!(recorded.contains("listing exploded"));
        assert_eq!(recorded, err.to_string());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_walk_error_survives_failed_job_bookkeeping() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        // Job rows can be created but never finished
        db.connection()
            .execute(
                "CREATE TRIGGER sync_jobs_readonly BEFORE UPDATE ON sync_jobs
                 BEGIN SELECT RAISE(ABORT, 'store offline'); END",
                (),
            )
            .await
            .unwrap();

        let mut remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("bad", "Bad", "d1", "100", true)]);
        remote.fail_on_parent = Some("bad".to_string());
        let engine = SyncEngine::new(&db, &remote, &provider);

        // The caller still sees the walk error, not the bookkeeping one
        let err = engine.run_full(&site_id).await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi(_)));
        assert!(err.to_string().contains("listing exploded"));

        let jobs = LibSqlSyncJobRepository::new(db.connection())
            .list_for_site(&site_id, 10)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Running);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_title_refresh_preserves_operator_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let site_id = setup_bound_site(&db).await;
        let provider = credentials();

        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "Old Name", "d1", "100", false)]);
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_full(&site_id).await.unwrap();

        let pages = LibSqlPageRepository::new(db.connection());
        let page = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();
        pages
            .set_status(&page.id, PageStatus::Published)
            .await
            .unwrap();

        let remote = FakeRemote::new()
            .with_nodes(ROOT_SENTINEL, vec![item("n1", "New Name", "d1", "100", false)]);
        let engine = SyncEngine::new(&db, &remote, &provider);
        engine.run_full(&site_id).await.unwrap();

        let reloaded = pages.find_by_node(&site_id, "n1").await.unwrap().unwrap();
        assert_eq!(reloaded.title, "New Name");
        assert_eq!(reloaded.slug, "old-name");
        assert_eq!(reloaded.status, PageStatus::Published);
        assert_eq!(reloaded.id, page.id);
    }
}
