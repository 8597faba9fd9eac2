//! Concurrent TTL cache for retrieved exemplars
//!
//! Shared by all in-flight requests. DashMap shards the map so concurrent
//! readers and writers never block on a single lock.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use super::Exemplar;
use crate::types::Mode;

struct CacheEntry {
    exemplars: Vec<Exemplar>,
    inserted: Instant,
}

pub struct ExemplarCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ExemplarCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cache key: mode, k and the SHA-256 of the whitespace-normalised,
    /// lowercased query
    pub fn key(mode: Mode, k: usize, query: &str) -> String {
        let normalized = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        format!("{}:{}:{:x}", mode, k, hasher.finalize())
    }

    /// Fresh entry for `key`; expired entries are evicted on access
    pub fn get(&self, key: &str) -> Option<Vec<Exemplar>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                return Some(entry.exemplars.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Store `exemplars`, sweeping out every expired entry first
    pub fn insert(&self, key: String, exemplars: Vec<Exemplar>) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted.elapsed() < ttl);
        self.entries.insert(
            key,
            CacheEntry {
                exemplars,
                inserted: Instant::now(),
            },
        );
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
    use std::sync::Arc;

    fn exemplar(content: &str) -> Exemplar {
        Exemplar {
            content: content.to_string(),
            content_type: Mode::Sales,
            topic: None,
            similarity: 0.9,
        }
    }

    #[test]
    fn test_key_normalises_query() {
        let a = ExemplarCache::key(Mode::Sales, 5, "Summer  Sale\nshoes");
        let b = ExemplarCache::key(Mode::Sales, 5, "summer sale shoes");
        assert_eq!(a, b);
        assert_ne!(a, ExemplarCache::key(Mode::Journalist, 5, "summer sale shoes"));
        assert_ne!(a, ExemplarCache::key(Mode::Sales, 3, "summer sale shoes"));
    }

    #[test]
    fn test_get_and_expiry() {
        let cache = ExemplarCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), vec![exemplar("hello")]);
        assert_eq!(cache.get("k").unwrap()[0].content, "hello");

        let expired = ExemplarCache::new(Duration::ZERO);
        expired.insert("k".to_string(), vec![exemplar("hello")]);
        assert!(expired.get("k").is_none());
        assert!(expired.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = ExemplarCache::new(Duration::from_millis(1));
        for i in 0..1000 {
            cache.insert(format!("query-{}", i), vec![exemplar("x")]);
        }
        std::thread::sleep(Duration::from_millis(5));

        cache.insert("fresh".to_string(), vec![exemplar("y")]);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(ExemplarCache::new(Duration::from_secs(60)));
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = format!("key-{}", i % 4);
                cache.insert(key.clone(), vec![exemplar("x")]);
                cache.get(&key).is_some()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(cache.len(), 4);
    }
}
