//! Cache storage.
//!
//! `CacheStore` is the seam between the gateway and whatever holds cached
//! payloads. `MemoryCacheStore` keeps entries in a bounded LRU map and checks
//! expiry on read.

use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::warn;

const SOURCE: &str = "cache::store";
const METRIC_CACHE_EVICT_TOTAL: &str = "quire_cache_evict_total";
/// Upper bound on an entry's lifetime; longer TTLs would overflow `Instant`.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Key-value store with per-entry time-to-live.
///
/// Implementations must tolerate concurrent calls; entries are independent so
/// no cross-key coordination is expected.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored payload, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<Bytes>;
    async fn put(&self, key: &str, value: Bytes, ttl: Duration);
    async fn delete(&self, key: &str);
    /// Remove every entry.
    async fn clear(&self);
}

#[derive(Clone)]
struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of entries held, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.read_entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Poisoned locks are recovered with a warning.
    fn read_entries(&self, op: &'static str) -> RwLockReadGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(target = SOURCE, op, "cache entries lock poisoned; reusing entries");
            poisoned.into_inner()
        })
    }

    fn write_entries(
        &self,
        op: &'static str,
    ) -> RwLockWriteGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(target = SOURCE, op, "cache entries lock poisoned; reusing entries");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.write_entries("get");
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            entries.pop(key);
            return None;
        }
        Some(entry.value.clone())
    }

    async fn put(&self, key: &str, value: Bytes, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        };
        let evicted = self.write_entries("put").push(key.to_string(), entry);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
        }
    }

    async fn delete(&self, key: &str) {
        self.write_entries("delete").pop(key);
    }

    async fn clear(&self) {
        self.write_entries("clear").clear();
    }
}
