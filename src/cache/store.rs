//! Process-wide response cache.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::{CacheKey, CachedResponse};
use crate::observability::metrics;

/// A thread-safe map from request fingerprint to captured response head.
///
/// Cloning is cheap and every clone sees the same entries. There is no
/// delete, eviction or expiry.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<DashMap<CacheKey, Arc<CachedResponse>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a snapshot.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedResponse>> {
        self.inner.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert a snapshot, replacing any previous entry for the key.
    pub fn put(&self, key: CacheKey, value: CachedResponse) {
        self.inner.insert(key, Arc::new(value));
        metrics::record_cache_size(self.inner.len());
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Response, StatusCode};

    fn key(path: &str, remote: &str) -> CacheKey {
        CacheKey::new(&Method::GET, &path.parse().unwrap(), remote)
    }

    fn snapshot(status: StatusCode) -> CachedResponse {
        let (parts, _) = Response::builder().status(status).body(()).unwrap().into_parts();
        CachedResponse::capture(&parts)
    }

    #[test]
    fn get_after_put() {
        let cache = CacheStore::new();
        let k = key("/a", "10.0.0.1:1");
        assert!(cache.get(&k).is_none());

        cache.put(k.clone(), snapshot(StatusCode::OK));
        assert_eq!(cache.get(&k).unwrap().status(), StatusCode::OK);
        assert!(cache.get(&k).is_some());
    }

    #[test]
    fn put_overwrites() {
        let cache = CacheStore::new();
        let k = key("/a", "10.0.0.1:1");

        cache.put(k.clone(), snapshot(StatusCode::OK));
        cache.put(k.clone(), snapshot(StatusCode::ACCEPTED));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&k).unwrap().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn clones_share_entries() {
        let cache = CacheStore::new();
        let other = cache.clone();
        other.put(key("/shared", "10.0.0.1:1"), snapshot(StatusCode::OK));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_puts_with_distinct_keys_lose_nothing() {
        let cache = CacheStore::new();
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        cache.put(key(&format!("/item/{i}"), &format!("10.0.0.{t}:4000")), snapshot(StatusCode::OK));
                    }
                })
            })
            .collect();

        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8 * 250);
        assert!(cache.get(&key("/item/249", "10.0.0.7:4000")).is_some());
    }

    #[tokio::test]
    async fn concurrent_get_and_put_on_same_key() {
        let cache = CacheStore::new();
        let k = key("/hot", "10.0.0.1:1");

        let mut tasks = Vec::new();
        for i in 0..32 {
            let cache = cache.clone();
            let k = k.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    cache.put(k, snapshot(StatusCode::OK));
                } else {
                    let _ = cache.get(&k);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(cache.len(), 1);
    }
}
