//! TTL cache for upstream responses with per-key miss coalescing.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed cache whose entries expire after a fixed time-to-live.
///
/// Concurrent misses on the same key serialize on a per-key lock and re-check
/// the cache once they hold it, so only the first caller reaches the network.
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            inflight: DashMap::new(),
            ttl,
        }
    }

    /// Non-expired value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if Instant::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: &str, value: V) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Return the cached value or run `fill` once to produce it.
    ///
    /// Errors from `fill` are returned as-is and never cached.
    pub async fn get_or_try_fill<F, Fut, E>(&self, key: &str, fill: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!(key, "response cache hit");
            return Ok(hit);
        }

        let lock = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have filled the entry while we waited.
        if let Some(hit) = self.get(key) {
            debug!(key, "response cache filled by concurrent request");
            return Ok(hit);
        }

        let value = fill().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
