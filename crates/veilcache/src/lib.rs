//! # veilcache
//!
//! Bounded caches backing the memoizing wrappers in `veils`.
//!
//! ## Architecture
//! - **BoundedCache**: the get/put/evict contract a memo table is built on
//! - **LruCache**: AHash map plus index-linked recency list (O(1) get/put/evict)
//! - **CacheEntry**: one cache plus its hit/miss statistics
//!
//! A cache may refuse a value (see [`CacheError`]); callers decide whether
//! that is fatal. `CacheEntry::store` treats it as a skipped insert.

#![warn(missing_docs)]

mod bounded;
mod entry;
mod lru;
mod stats;

pub use bounded::{BoundedCache, CacheError};
pub use entry::CacheEntry;
pub use lru::LruCache;
pub use stats::CacheStats;

/// Capacity used when no cache factory is configured.
pub const DEFAULT_CAPACITY: usize = 128;
