//! Per-entry cache statistics

use std::cell::Cell;

/// Hit/miss counters for one memo table.
///
/// Counters are plain cells: a table is owned by a single wrapper and
/// never touched from more than one thread.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    hits: Cell<u64>,
    misses: Cell<u64>,
    inserts: Cell<u64>,
    evictions: Cell<u64>,
    rejections: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl CacheStats {
    /// Create a zeroed tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lookup that found a stored result
    pub fn record_hit(&self) {
        bump(&self.hits);
    }

    /// Record a lookup that found nothing
    pub fn record_miss(&self) {
        bump(&self.misses);
    }

    /// Record a stored result
    pub fn record_insert(&self) {
        bump(&self.inserts);
    }

    /// Record an entry pushed out by capacity
    pub fn record_eviction(&self) {
        bump(&self.evictions);
    }

    /// Record a result the cache refused to store
    pub fn record_rejection(&self) {
        bump(&self.rejections);
    }

    /// Total hits
    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    /// Total misses
    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    /// Total inserts
    pub fn inserts(&self) -> u64 {
        self.inserts.get()
    }

    /// Total evictions
    pub fn evictions(&self) -> u64 {
        self.evictions.get()
    }

    /// Total rejected stores
    pub fn rejections(&self) -> u64 {
        self.rejections.get()
    }

    /// Hit ratio (0.0 to 1.0), 0.0 before any lookup
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.inserts,
            &self.evictions,
            &self.rejections,
        ] {
            counter.set(0);
        }
    }
}
