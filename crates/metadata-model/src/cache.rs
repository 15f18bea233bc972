//! The request-scoped metadata cache (§4.2): a TTL + insertion-order LRU map
//! keyed by a canonicalized, credential-scrubbed URL.
//!
//! Unlike a typical access-order LRU, reads never bump recency here — eviction
//! is strictly by insertion order, matching "evict the least-recently-inserted
//! entry" in the data model.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    fetched_at: Instant,
}

struct CacheState<V> {
    map: HashMap<String, CacheEntry<V>>,
    insertion_order: VecDeque<String>,
}

/// Process-local cache for upstream metadata responses.
///
/// `V` is typically a deserialized JSON payload (`serde_json::Value`) but is
/// left generic so callers can cache whatever shape they parse responses into.
pub struct RequestScopedCache<V> {
    state: Mutex<CacheState<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> RequestScopedCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                map: HashMap::with_capacity(capacity),
                insertion_order: VecDeque::with_capacity(capacity),
            }),
            ttl,
            capacity,
        }
    }

    pub fn with_default_ttl(capacity: usize) -> Self {
        Self::new(Duration::from_secs(5 * 60), capacity)
    }

    /// Returns the cached payload if present and not expired. Does not affect
    /// eviction order.
    pub fn get(&self, key: &str) -> Option<V> {
        let state = self.state.lock().expect("cache mutex poisoned");
        let entry = state.map.get(key)?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Inserts or overwrites `key`. If the cache is at capacity, evicts the
    /// least-recently-inserted entry first (after dropping any already-expired
    /// entries, which keeps real memory use tight without changing the
    /// insertion-order eviction semantics for live entries).
    pub fn insert(&self, key: String, payload: V) {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        self.evict_expired(&mut state);

        if !state.map.contains_key(&key) {
            state.insertion_order.push_back(key.clone());
        }
        state.map.insert(
            key,
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );

        while state.map.len() > self.capacity {
            if let Some(oldest) = state.insertion_order.pop_front() {
                state.map.remove(&oldest);
            } else {
                break;
            }
        }
    }

    fn evict_expired(&self, state: &mut CacheState<V>) {
        let ttl = self.ttl;
        state.map.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        state
            .insertion_order
            .retain(|key| state.map.contains_key(key));
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("cache mutex poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_on_empty_cache() {
        let cache: RequestScopedCache<String> = RequestScopedCache::with_default_ttl(10);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn hit_after_insert() {
        let cache = RequestScopedCache::with_default_ttl(10);
        cache.insert("k".to_string(), "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = RequestScopedCache::new(Duration::from_millis(10), 10);
        cache.insert("k".to_string(), 1);
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn lru_cap_evicts_oldest_insertion() {
        let cache = RequestScopedCache::new(Duration::from_secs(300), 2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert!(cache.get("a").is_none(), "oldest insertion should be evicted");
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert!(cache.len() <= 2);
    }

    #[test]
    fn reads_do_not_bump_recency() {
        let cache = RequestScopedCache::new(Duration::from_secs(300), 2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        // Read "a" repeatedly; insertion order still says "a" is oldest.
        for _ in 0..5 {
            cache.get("a");
        }

        cache.insert("c".to_string(), 3);
        assert!(cache.get("a").is_none(), "reads must not protect an entry from eviction");
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }
}
