//! Bounded per-search-kind result cache (spec §4.P "Cache fabric"): each
//! search kind (basic, boolean, hybrid, ...) gets its own bounded, TTL-aware
//! LRU cache, keyed by a hash of its normalised query shape. There is no
//! fine-grained dependency tracking — any graph mutation invalidates every
//! cache at once, since a single relation add can change the result set of
//! an arbitrary query.

use dashmap::DashMap;
use kgraph_core::config::CacheBudgetConfig;
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct CachedValue {
    value: serde_json::Value,
    inserted_at: Instant,
}

/// One bounded cache per search kind, all sharing the configured
/// capacity/TTL budget.
pub struct CacheFabric {
    budget: CacheBudgetConfig,
    caches: DashMap<&'static str, Mutex<LruCache<u64, CachedValue>>>,
}

impl CacheFabric {
    pub fn new(budget: CacheBudgetConfig) -> Self {
        CacheFabric { budget, caches: DashMap::new() }
    }

    fn with_cache<R>(&self, kind: &'static str, f: impl FnOnce(&mut LruCache<u64, CachedValue>) -> R) -> R {
        let cap = NonZeroUsize::new(self.budget.max_entries.max(1)).unwrap();
        let entry = self.caches.entry(kind).or_insert_with(|| Mutex::new(LruCache::new(cap)));
        let mut guard = entry.lock();
        f(&mut guard)
    }

    /// Looks up `key` in the cache for `kind`; a hit older than the
    /// configured TTL is evicted and treated as a miss.
    pub fn get(&self, kind: &'static str, key: u64) -> Option<serde_json::Value> {
        let ttl = Duration::from_millis(self.budget.ttl_ms);
        self.with_cache(kind, |cache| match cache.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < ttl => Some(entry.value.clone()),
            Some(_) => {
                cache.pop(&key);
                None
            }
            None => None,
        })
    }

    pub fn put(&self, kind: &'static str, key: u64, value: serde_json::Value) {
        self.with_cache(kind, |cache| {
            cache.put(key, CachedValue { value, inserted_at: Instant::now() });
        });
    }

    /// Drops every cached entry across every search kind. Registered as a
    /// subscriber for "any" event so it fires on every mutation.
    pub fn invalidate_all(&self) {
        for entry in self.caches.iter() {
            entry.value().lock().clear();
        }
    }

    pub fn len(&self, kind: &'static str) -> usize {
        self.with_cache(kind, |cache| cache.len())
    }
}

/// Hashes a query's canonical shape (already-normalised parts, e.g. lowercased
/// terms and sorted filter fields) into a cache key.
pub fn query_key(parts: &[&str]) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    for p in parts {
        p.hash(&mut hasher);
    }
    hasher.finish()
}
