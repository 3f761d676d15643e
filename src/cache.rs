//! Advisory response cache
//!
//! TTL-keyed store of prior provider responses. Admission decisions carry a
//! `cache_hit` flag while an entry is fresh; the caller decides whether to use
//! the cached payload instead of calling out. Entries are never evicted
//! proactively — staleness is judged on read.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached provider response
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub payload: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// TTL cache of prior responses, keyed by endpoint
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Store a response with the default TTL, replacing any previous entry
    pub fn store(&self, endpoint: &str, payload: Value) {
        self.store_with_ttl(endpoint, payload, self.default_ttl);
    }

    /// Store a response with an explicit TTL
    pub fn store_with_ttl(&self, endpoint: &str, payload: Value, ttl: Duration) {
        debug!(endpoint, ttl_secs = ttl.as_secs(), "caching response");
        self.entries.insert(
            endpoint.to_string(),
            CachedResponse {
                payload,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Whether a fresh entry exists. Pure query: a stale entry is reported as
    /// absent but left in place.
    pub fn has_cached_response(&self, endpoint: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(endpoint)
            .is_some_and(|entry| entry.is_fresh(now))
    }

    /// The cached payload, while fresh
    pub fn get(&self, endpoint: &str) -> Option<Value> {
        let now = Instant::now();
        self.entries.get(endpoint).and_then(|entry| {
            if entry.is_fresh(now) {
                Some(entry.payload.clone())
            } else {
                None
            }
        })
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = ResponseCache::new();
        assert!(!cache.has_cached_response("whois"));
        assert!(cache.get("whois").is_none());
    }

    #[test]
    fn test_hit_while_fresh() {
        let cache = ResponseCache::new();
        cache.store("whois", json!({"domain": "example.com"}));

        assert!(cache.has_cached_response("whois"));
        assert_eq!(
            cache.get("whois"),
            Some(json!({"domain": "example.com"}))
        );
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let cache = ResponseCache::new();
        cache.store_with_ttl("whois", json!({"domain": "example.com"}), Duration::from_millis(20));

        assert!(cache.has_cached_response("whois"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(!cache.has_cached_response("whois"));
        assert!(cache.get("whois").is_none());
    }

    #[test]
    fn test_store_replaces_previous_entry() {
        let cache = ResponseCache::new();
        cache.store_with_ttl("whois", json!(1), Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(40));
        cache.store("whois", json!(2));

        assert_eq!(cache.get("whois"), Some(json!(2)));
    }
}
