//! The bounded cache contract

use std::fmt;

/// Errors a cache may raise when asked to store a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A single value outweighs the cache's per-entry limit
    TooLarge {
        /// Weight reported for the rejected value
        weight: usize,
        /// Largest weight the cache accepts
        max: usize,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::TooLarge { weight, max } => {
                write!(f, "Value too large: weight {} (max {})", weight, max)
            }
        }
    }
}

impl std::error::Error for CacheError {}

/// A fixed-capacity key/value cache.
///
/// Implementations own their eviction policy. `put` returns the entry that
/// was evicted to make room, if any.
pub trait BoundedCache<K, V> {
    /// Look up a key, marking it as recently used
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Store a value, evicting an older entry when full
    fn put(&mut self, key: K, value: V) -> Result<Option<(K, V)>, CacheError>;

    /// Number of stored entries
    fn len(&self) -> usize;

    /// Maximum number of entries
    fn capacity(&self) -> usize;

    /// Drop every entry
    fn clear(&mut self);

    /// Check if the cache holds nothing
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
