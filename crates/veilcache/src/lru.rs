//! Least-recently-used cache
//!
//! Entries live in a slab (`Vec<Option<Slot>>`) threaded by a doubly-linked
//! recency list of slab indices, so lookups, promotion and eviction are O(1).

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::bounded::{BoundedCache, CacheError};

/// Slab slot holding one entry and its neighbours in recency order
struct Slot<K, V> {
    key: K,
    value: V,
    newer: Option<usize>,
    older: Option<usize>,
}

/// LRU cache with a fixed entry count and an optional per-entry weight limit
pub struct LruCache<K, V> {
    index: HashMap<K, usize, RandomState>,
    slots: Vec<Option<Slot<K, V>>>,
    vacant: Vec<usize>,
    newest: Option<usize>,
    oldest: Option<usize>,
    capacity: usize,
    weigher: Option<fn(&V) -> usize>,
    max_weight: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            newest: None,
            oldest: None,
            capacity,
            weigher: None,
            max_weight: usize::MAX,
        }
    }

    /// Create a cache that also refuses any single value whose weight,
    /// as reported by `weigher`, exceeds `max_weight`
    pub fn with_max_weight(capacity: usize, max_weight: usize, weigher: fn(&V) -> usize) -> Self {
        let mut cache = Self::new(capacity);
        cache.weigher = Some(weigher);
        cache.max_weight = max_weight;
        cache
    }

    /// Get a value and promote it to most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Check for a key without touching recency order
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace a value.
    ///
    /// Returns the evicted entry when the cache was full. A value heavier
    /// than the weight limit is rejected before anything is modified.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<(K, V)>, CacheError> {
        if let Some(weigh) = self.weigher {
            let weight = weigh(&value);
            if weight > self.max_weight {
                return Err(CacheError::TooLarge {
                    weight,
                    max: self.max_weight,
                });
            }
        }

        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.promote(idx);
            return Ok(None);
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let idx = self.vacant.pop().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });
        self.slots[idx] = Some(Slot {
            key: key.clone(),
            value,
            newer: None,
            older: None,
        });
        self.link_newest(idx);
        self.index.insert(key, idx);

        Ok(evicted)
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.detach(idx);
        self.vacant.push(idx);
        self.slots[idx].take().map(|slot| slot.value)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.vacant.clear();
        self.newest = None;
        self.oldest = None;
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let idx = self.oldest?;
        // Unlink while the slot is still populated; detach reads its neighbours.
        self.detach(idx);
        let slot = self.slots[idx].take()?;
        self.index.remove(&slot.key);
        self.vacant.push(idx);
        Some((slot.key, slot.value))
    }

    fn promote(&mut self, idx: usize) {
        if self.newest == Some(idx) {
            return;
        }
        self.detach(idx);
        self.link_newest(idx);
    }

    fn link_newest(&mut self, idx: usize) {
        let previous = self.newest;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.newer = None;
            slot.older = previous;
        }
        if let Some(prev_idx) = previous {
            if let Some(prev) = self.slots[prev_idx].as_mut() {
                prev.newer = Some(idx);
            }
        }
        self.newest = Some(idx);
        if self.oldest.is_none() {
            self.oldest = Some(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (newer, older) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.newer, slot.older),
            None => return,
        };

        match newer {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.older = older;
                }
            }
            None => self.newest = older,
        }
        match older {
            Some(o) => {
                if let Some(slot) = self.slots[o].as_mut() {
                    slot.newer = newer;
                }
            }
            None => self.oldest = newer,
        }

        if let Some(slot) = self.slots[idx].as_mut() {
            slot.newer = None;
            slot.older = None;
        }
    }
}

impl<K, V> BoundedCache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn put(&mut self, key: K, value: V) -> Result<Option<(K, V)>, CacheError> {
        LruCache::put(self, key, value)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }

    fn clear(&mut self) {
        LruCache::clear(self)
    }
}
