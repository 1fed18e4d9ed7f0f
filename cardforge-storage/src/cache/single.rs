//! Single-tier LRU cache implementing the same [`CacheBackend`] contract as
//! [`super::tiered::TieredCache`], selectable at construction time when the
//! promotion machinery isn't worth the complexity.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;

use super::tiered::Tier;
use super::traits::{CacheBackend, CacheStats};

pub struct SingleTierCache<V: Clone + Send + Sync> {
    inner: Mutex<LruCache<String, V>>,
    stats: Mutex<CacheStats>,
}

impl<V: Clone + Send + Sync> SingleTierCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to at least 1"),
            )),
            stats: Mutex::new(CacheStats::default()),
        }
    }
}

#[async_trait]
impl<V: Clone + Send + Sync> CacheBackend<V> for SingleTierCache<V> {
    async fn get(&self, key: &str) -> Option<V> {
        let value = self.inner.lock().unwrap().get(key).cloned();
        let mut stats = self.stats.lock().unwrap();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        value
    }

    async fn put(&self, key: String, value: V) {
        let evicted = self.inner.lock().unwrap().push(key, value);
        if evicted.is_some() {
            self.stats.lock().unwrap().evictions += 1;
        }
    }

    /// A single tier has no cooler tier to spare, so every insert lands the
    /// same way regardless of `tier`.
    async fn put_in_tier(&self, key: String, value: V, _tier: Tier) {
        self.put(key, value).await;
    }

    async fn evict(&self, key: &str) -> Option<V> {
        self.inner.lock().unwrap().pop(key)
    }

    async fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    async fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.lock().unwrap();
        stats.entry_count = self.inner.lock().unwrap().len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let cache = SingleTierCache::new(4);
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.get("a").await, Some(1));
    }

    #[tokio::test]
    async fn over_capacity_evicts_lru() {
        let cache: SingleTierCache<i32> = SingleTierCache::new(2);
        cache.put("a".to_string(), 1).await;
        cache.put("b".to_string(), 2).await;
        cache.put("c".to_string(), 3).await;

        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, Some(3));
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn evict_removes_entry_and_clear_empties_cache() {
        let cache = SingleTierCache::new(4);
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.evict("a").await, Some(1));
        assert_eq!(cache.get("a").await, None);

        cache.put("b".to_string(), 2).await;
        cache.clear().await;
        assert_eq!(cache.stats().await.entry_count, 0);
    }
}
