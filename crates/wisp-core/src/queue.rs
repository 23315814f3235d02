//! Sync request queueing seam and push-trigger debounce.
//!
//! Delivery, retry and backoff are the queue implementation's contract; the
//! engine only enqueues. Poll requests carry a per-site dedupe key so
//! concurrently queued polls for one site collapse to a single pending unit
//! of work at the queue layer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{SiteId, SyncJobType};

/// One unit of queued sync work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub site_id: SiteId,
    pub job_type: SyncJobType,
    /// Queue-level idempotency key; identical pending keys collapse
    pub dedupe_key: Option<String>,
}

impl SyncRequest {
    #[must_use]
    pub fn full(site_id: SiteId) -> Self {
        Self {
            site_id,
            job_type: SyncJobType::Full,
            dedupe_key: None,
        }
    }

    #[must_use]
    pub fn poll(site_id: SiteId) -> Self {
        Self {
            dedupe_key: Some(format!("poll:{site_id}")),
            site_id,
            job_type: SyncJobType::Poll,
        }
    }
}

/// Transport-agnostic enqueue seam
#[allow(async_fn_in_trait)]
pub trait SyncQueue {
    async fn enqueue(&self, request: SyncRequest) -> Result<()>;
}

/// Collapses bursts of push notifications into at most one poll enqueue per
/// site per interval. State lives in the worker process, constructed at
/// startup and injected where needed.
pub struct PollDebouncer {
    min_interval: Duration,
    last_enqueued: Mutex<HashMap<SiteId, Instant>>,
}

impl PollDebouncer {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_enqueued: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueue a poll for the site unless one was enqueued within the
    /// minimum interval. Returns whether a request was actually enqueued.
    pub async fn notify(&self, queue: &impl SyncQueue, site_id: SiteId) -> Result<bool> {
        let now = Instant::now();
        {
            let mut last = self.last_enqueued.lock().await;
            if let Some(previous) = last.get(&site_id) {
                if now.duration_since(*previous) < self.min_interval {
                    return Ok(false);
                }
            }
            last.insert(site_id, now);
        }

        queue.enqueue(SyncRequest::poll(site_id)).await?;
        Ok(true)
    }
}
