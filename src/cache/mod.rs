//! Short-TTL response cache.
//!
//! One entry per logical resource (`CacheKey`). Entries are overwritten on
//! every successful fetch and judged fresh or stale only when read.

pub mod store;

pub use store::{CacheEntry, CacheKey, CacheStore};
