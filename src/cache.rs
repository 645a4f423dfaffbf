//! Generic read-through TTL cache used in front of leaderboard and profile reads.

use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

/// Simple TTL cache keyed by a clonable key.
///
/// Entries expire `ttl` after insertion; expired entries are removed eagerly on
/// access. There is no eviction strategy beyond TTL expiration, which is fine
/// for the handful of small per-process caches this backend maintains.
pub struct TtlCache<K, V> {
    ttl: Duration,
    map: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a cloned value along with the time remaining before it expires.
    ///
    /// Returns `None` when the key is absent or the entry has expired.
    pub async fn get(&self, key: &K) -> Option<(V, Duration)> {
        {
            let guard = self.map.read().await;
            if let Some((inserted_at, value)) = guard.get(key) {
                let age = inserted_at.elapsed();
                if age < self.ttl {
                    return Some((value.clone(), self.ttl - age));
                }
            } else {
                return None;
            }
        }

        // Entry expired: take the write lock only to remove it.
        let mut guard = self.map.write().await;
        if let Some((inserted_at, _)) = guard.get(key) {
            if inserted_at.elapsed() >= self.ttl {
                guard.remove(key);
            }
        }
        None
    }

    /// Insert or replace a value, resetting its TTL.
    pub async fn insert(&self, key: K, value: V) {
        let mut guard = self.map.write().await;
        guard.insert(key, (Instant::now(), value));
    }

    /// Drop a single entry, forcing the next read to go through the loader.
    pub async fn invalidate(&self, key: &K) {
        let mut guard = self.map.write().await;
        guard.remove(key);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut guard = self.map.write().await;
        guard.clear();
    }

    /// Read-through access: return the cached value or run `loader` and cache
    /// its result. Only successful loads are cached, so a `NotFound` never
    /// poisons the cache.
    ///
    /// The loader runs outside the lock; two concurrent misses on the same key
    /// may both load, with the later insert winning. Harmless for idempotent
    /// loaders.
    pub async fn get_or_load<F, Fut, E>(&self, key: K, loader: F) -> Result<(V, Duration), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            return Ok(hit);
        }

        let value = loader().await?;
        self.insert(key, value.clone()).await;
        Ok((value, self.ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = TtlCache::<String, u32>::new(Duration::from_secs(60));
        assert!(cache.get(&"a".to_string()).await.is_none());

        cache.insert("a".to_string(), 7).await;
        let (value, remaining) = cache.get(&"a".to_string()).await.unwrap();
        assert_eq!(value, 7);
        assert!(remaining <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn expired_entries_are_removed() {
        let cache = TtlCache::<String, u32>::new(Duration::from_millis(0));
        cache.insert("a".to_string(), 7).await;
        assert!(cache.get(&"a".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn get_or_load_caches_success_only() {
        let cache = TtlCache::<String, u32>::new(Duration::from_secs(60));

        let err: Result<(u32, Duration), &str> = cache
            .get_or_load("a".to_string(), || async { Err("boom") })
            .await;
        assert!(err.is_err());
        assert!(cache.get(&"a".to_string()).await.is_none());

        let (value, _) = cache
            .get_or_load("a".to_string(), || async { Ok::<_, &str>(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);

        // Second call must not invoke the loader again.
        let (value, _) = cache
            .get_or_load("a".to_string(), || async { Ok::<_, &str>(99) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = TtlCache::<String, u32>::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 7).await;
        cache.invalidate(&"a".to_string()).await;
        assert!(cache.get(&"a".to_string()).await.is_none());
    }
}
