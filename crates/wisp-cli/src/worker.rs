//! In-process sync worker.
//!
//! A scheduler tick enqueues a debounced poll for every sync-enabled
//! binding; the queue dedupes by key and requests are processed one at a
//! time, so a worker never runs two sync jobs concurrently.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};
use wisp_core::auth::StaticCredentialProvider;
use wisp_core::db::{BindingRepository, Database, LibSqlBindingRepository};
use wisp_core::models::SyncJobType;
use wisp_core::queue::{PollDebouncer, SyncQueue, SyncRequest};
use wisp_core::remote::RemoteClient;
use wisp_core::{Config, Result, SyncEngine};

const SCHEDULER_TICK: Duration = Duration::from_secs(5);

/// FIFO queue with dedupe-key collapsing for pending requests
#[derive(Default)]
pub struct InMemoryQueue {
    inner: Mutex<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    requests: VecDeque<SyncRequest>,
    pending_keys: HashSet<String>,
}

impl InMemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending request, releasing their dedupe keys
    pub async fn drain(&self) -> Vec<SyncRequest> {
        let mut inner = self.inner.lock().await;
        inner.pending_keys.clear();
        inner.requests.drain(..).collect()
    }
}

impl SyncQueue for InMemoryQueue {
    async fn enqueue(&self, request: SyncRequest) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(key) = &request.dedupe_key {
            if !inner.pending_keys.insert(key.clone()) {
                return Ok(());
            }
        }
        inner.requests.push_back(request);
        Ok(())
    }
}

/// Enqueue a debounced poll for every sync-enabled binding. Transient store
/// or queue failures are logged and skipped; the scheduler must outlive them.
async fn schedule_polls(
    bindings: &impl BindingRepository,
    debouncer: &PollDebouncer,
    queue: &impl SyncQueue,
) {
    let enabled = match bindings.list_sync_enabled().await {
        Ok(enabled) => enabled,
        Err(error) => {
            warn!(%error, "listing sync-enabled bindings failed");
            return;
        }
    };
    for binding in enabled {
        if let Err(error) = debouncer.notify(queue, binding.site_id).await {
            warn!(site = %binding.site_id, %error, "poll enqueue failed");
        }
    }
}

/// Run the worker loop until the process is stopped
pub async fn run(config: &Config) -> Result<()> {
    let db = Database::open(&config.database_path).await?;
    let remote = RemoteClient::new(&config.remote_base_url)?;
    let provider =
        StaticCredentialProvider::new(config.access_token.clone().unwrap_or_default());
    let engine = SyncEngine::new(&db, &remote, &provider);

    let bindings = LibSqlBindingRepository::new(db.connection());
    let queue = InMemoryQueue::new();
    let debouncer = PollDebouncer::new(config.poll_debounce);

    info!(
        db = %config.database_path,
        debounce_secs = config.poll_debounce.as_secs(),
        "worker started"
    );

    let mut ticker = tokio::time::interval(SCHEDULER_TICK);
    loop {
        ticker.tick().await;

        schedule_polls(&bindings, &debouncer, &queue).await;

        for request in queue.drain().await {
            let outcome = match request.job_type {
                SyncJobType::Full => engine.run_full(&request.site_id).await,
                SyncJobType::Poll => engine.run_poll(&request.site_id).await,
            };
            // The failure is already persisted on the job record; the worker
            // keeps going.
            if let Err(error) = outcome {
                warn!(site = %request.site_id, %error, "sync run failed");
            }
        }
    }
}
