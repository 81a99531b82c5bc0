//! TTL-gated storage of last-good upstream payloads.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

use crate::observability::metrics;

/// Identifier of a cached upstream resource.
///
/// The set of keys is fixed by the routes that use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(&'static str);

impl CacheKey {
    pub const NIFTY_50: CacheKey = CacheKey("nifty50");
    pub const NIFTY_500: CacheKey = CacheKey("nifty");
    pub const BANK_NIFTY: CacheKey = CacheKey("bankNifty");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// A stored payload and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: Instant,
}

impl CacheEntry {
    /// Fresh while strictly less than `ttl` has elapsed.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Keyed payload store with lazy expiry.
///
/// Nothing is ever evicted; staleness is decided when reading.
#[derive(Debug, Clone)]
pub struct CacheStore {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// The fresh entry for `key`, if any.
    pub fn get(&self, key: CacheKey, now: Instant) -> Option<CacheEntry> {
        let entry = self
            .entries
            .get(&key)
            .filter(|e| e.is_fresh(now, self.ttl))
            .map(|e| e.value().clone());
        metrics::record_cache_lookup(key.as_str(), entry.is_some());
        entry
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn put(&self, key: CacheKey, value: Value, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Entry regardless of freshness.
    pub fn peek(&self, key: CacheKey) -> Option<CacheEntry> {
        self.entries.get(&key).map(|e| e.value().clone())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_until_ttl() {
        let cache = CacheStore::new(Duration::from_millis(5000));
        let key = CacheKey::new("k");
        cache.put(key, json!({"data": [1]}), Instant::now());

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert_eq!(cache.get(key, Instant::now()).unwrap().value, json!({"data": [1]}));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(key, Instant::now()).is_none());
        assert!(cache.peek(key).is_some(), "stale entries are never evicted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_refreshes() {
        let cache = CacheStore::new(Duration::from_millis(5000));
        let key = CacheKey::NIFTY_50;
        cache.put(key, json!(1), Instant::now());
        tokio::time::advance(Duration::from_millis(4000)).await;
        cache.put(key, json!(2), Instant::now());
        tokio::time::advance(Duration::from_millis(4000)).await;

        assert_eq!(cache.get(key, Instant::now()).unwrap().value, json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = CacheStore::new(Duration::from_secs(5));
        let now = Instant::now();
        cache.put(CacheKey::NIFTY_50, json!("a"), now);
        assert!(cache.get(CacheKey::BANK_NIFTY, now).is_none());
        assert_eq!(cache.get(CacheKey::NIFTY_50, now).unwrap().value, json!("a"));
    }
}
