//! Cache entry: one bounded cache plus its statistics

use tracing::debug;

use crate::bounded::BoundedCache;
use crate::stats::CacheStats;

/// A memo table for a single member.
///
/// Lookups and stores record statistics. A store the cache refuses is
/// logged and counted, never returned as an error.
pub struct CacheEntry<K, V> {
    cache: Box<dyn BoundedCache<K, V>>,
    stats: CacheStats,
}

impl<K, V: Clone> CacheEntry<K, V> {
    /// Wrap a cache produced by a cache factory
    pub fn new(cache: Box<dyn BoundedCache<K, V>>) -> Self {
        Self {
            cache,
            stats: CacheStats::new(),
        }
    }

    /// Return a stored result for `key`
    pub fn lookup(&mut self, key: &K) -> Option<V> {
        match self.cache.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Store a result, returning whether the cache accepted it
    pub fn store(&mut self, key: K, value: V) -> bool {
        match self.cache.put(key, value) {
            Ok(evicted) => {
                self.stats.record_insert();
                if evicted.is_some() {
                    self.stats.record_eviction();
                }
                true
            }
            Err(e) => {
                debug!("Result not cached: {}", e);
                self.stats.record_rejection();
                false
            }
        }
    }

    /// Statistics for this entry
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if no result is stored
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of stored results
    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Drop stored results and reset statistics
    pub fn clear(&mut self) {
        self.cache.clear();
        self.stats.reset();
    }
}
