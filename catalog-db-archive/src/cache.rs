//! LRU cache of parsed archival records
//!
//! Holds only archival originals, keyed by [`RecordId`]. Overlay and created
//! records never enter it, so a hit is always the unedited archive content.
//! Entries are shared as `Arc<CatalogRecord>`; callers clone before mutating.

use catalog_db_core::{CatalogRecord, RecordId};
use lru::LruCache;
use parking_lot::RwLock;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of parsed records kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Thread-safe LRU cache for parsed records
pub struct RecordCache {
    inner: RwLock<LruCache<RecordId, Arc<CatalogRecord>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecordCache {
    /// Create a cache holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a cached record, promoting it to most-recently-used.
    pub fn get(&self, id: RecordId) -> Option<Arc<CatalogRecord>> {
        let hit = self.inner.write().get(&id).cloned();
        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Peek without touching LRU order or counters
    pub fn peek(&self, id: RecordId) -> Option<Arc<CatalogRecord>> {
        self.inner.read().peek(&id).cloned()
    }

    pub fn insert(&self, id: RecordId, record: Arc<CatalogRecord>) {
        self.inner.write().put(id, record);
    }

    /// Drop one entry. Returns true if it was cached.
    pub fn invalidate(&self, id: RecordId) -> bool {
        self.inner.write().pop(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: inner.len(),
            capacity: inner.cap().get(),
        }
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("stats", &self.stats())
            .finish()
    }
}
