//! TTL cache of catalog search results.
//!
//! Entries are keyed by `(location, normalized term)` and stored as
//! [`SearchCacheEntry`] documents in the shared [`KvStore`]. An entry with no
//! candidates records a confirmed "not found" and gets the shorter empty TTL.
//!
//! The cache never fails its caller: read errors are misses, write errors are
//! logged. Hit bookkeeping and [`CatalogCache::spawn_set`] run as detached
//! tasks and are never awaited on the request path. They are tracked, so a
//! short-lived process can [`flush`](CatalogCache::flush) them before exit.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use grocer_core::models::{ProductCandidate, SearchCacheEntry};
use grocer_core::store::KvStore;
use grocer_core::terms::{normalize_term, slugify};

use crate::config::CacheConfig;

/// Key prefix of every cache entry.
pub const CACHE_PREFIX: &str = "search_cache/";
/// Location segment used when a search is not scoped to a store.
pub const GLOBAL_LOCATION: &str = "global";

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Storage key for `(location, term)`. Terms that normalize identically
/// share a key.
pub fn cache_key(location: Option<&str>, term: &str) -> String {
    format!(
        "{}{}/{}",
        CACHE_PREFIX,
        slugify(location.unwrap_or(GLOBAL_LOCATION)),
        slugify(&normalize_term(term))
    )
}

#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    empty_ttl: Duration,
    background: Arc<Mutex<JoinSet<()>>>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn KvStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_hours * 3600),
            empty_ttl: Duration::from_secs(config.empty_ttl_hours * 3600),
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    fn spawn_tracked<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut set = self.background.lock();
        // Reap finished tasks so the set only holds pending work.
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Wait for every detached write and hit update spawned so far.
    pub async fn flush(&self) {
        let mut pending = std::mem::take(&mut *self.background.lock());
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "background cache task failed");
            }
        }
    }

    /// Fetch a live entry. `None` on miss, expiry, or any read failure.
    pub async fn get(&self, location: Option<&str>, term: &str) -> Option<SearchCacheEntry> {
        let key = cache_key(location, term);
        let doc = match self.store.get(&key).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let entry: SearchCacheEntry = match serde_json::from_value(doc) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };

        let now = now_ms();
        if entry.is_expired(now) {
            debug!(key = %key, "cache entry expired");
            return None;
        }

        debug!(key = %key, candidates = entry.candidates.len(), "cache hit");
        self.record_hit(key, now);
        Some(entry)
    }

    fn record_hit(&self, key: String, now: i64) {
        let store = self.store.clone();
        self.spawn_tracked(async move {
            let result = async {
                store.increment(&key, "hitCount", 1, None).await?;
                store.set(&key, json!({ "lastAccessedAt": now }), true).await
            }
            .await;
            if let Err(e) = result {
                debug!(key = %key, error = %e, "cache hit bookkeeping failed");
            }
        });
    }

    /// Store a search result with the default TTL for its kind.
    pub async fn set(
        &self,
        location: Option<&str>,
        term: &str,
        candidates: Vec<ProductCandidate>,
        total: u64,
    ) {
        let ttl = if candidates.is_empty() {
            self.empty_ttl
        } else {
            self.ttl
        };
        self.set_with_ttl(location, term, candidates, total, ttl).await
    }

    /// Store a search result with an explicit TTL.
    pub async fn set_with_ttl(
        &self,
        location: Option<&str>,
        term: &str,
        candidates: Vec<ProductCandidate>,
        total: u64,
        ttl: Duration,
    ) {
        let key = cache_key(location, term);
        let now = now_ms();
        let entry = SearchCacheEntry {
            location: location.unwrap_or(GLOBAL_LOCATION).to_string(),
            raw_term: term.to_string(),
            normalized_term: normalize_term(term),
            candidates,
            total,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl.as_millis() as i64,
            hit_count: 0,
            last_accessed_at: None,
        };

        let doc = match serde_json::to_value(&entry) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = %key, error = %e, "cache entry serialization failed");
                return;
            }
        };
        match self.store.set(&key, doc, false).await {
            Ok(()) => debug!(
                key = %key,
                candidates = entry.candidates.len(),
                ttl_secs = ttl.as_secs(),
                "cache write"
            ),
            Err(e) => warn!(key = %key, error = %e, "cache write failed"),
        }
    }

    /// [`set`](Self::set) as a detached task. Pending writes finish on
    /// [`flush`](Self::flush).
    pub fn spawn_set(
        &self,
        location: Option<String>,
        term: String,
        candidates: Vec<ProductCandidate>,
        total: u64,
    ) {
        let cache = self.clone();
        self.spawn_tracked(async move {
            cache.set(location.as_deref(), &term, candidates, total).await;
        });
    }

    /// Delete expired entries. Optional: expiry is enforced on read.
    pub async fn sweep(&self, now_ms: i64) -> anyhow::Result<u64> {
        self.store.delete_expired(CACHE_PREFIX, now_ms).await
    }
}
