//! Three-tier LRU cache with access-count promotion between tiers.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;

use super::traits::{CacheBackend, CacheStats};

pub const DEFAULT_L1_SIZE: usize = 200;
pub const DEFAULT_L2_SIZE: usize = 1000;
pub const DEFAULT_L3_SIZE: usize = 10_000;
pub const DEFAULT_PROMOTION_THRESHOLD: u32 = 5;

/// Which tier a `put` should target. Defaults to `Warm` (L2) per the write
/// path rule; `put_in_tier` accepts an explicit override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

struct WarmEntry<V> {
    value: V,
    accesses: u32,
}

/// L1 holds bare values (always hot, no promotion tracking needed). L2/L3
/// pair each value with an access counter so a hit can be promoted once the
/// counter exceeds `promotion_threshold`.
pub struct TieredCache<V: Clone + Send + Sync> {
    l1: Mutex<LruCache<String, V>>,
    l2: Mutex<LruCache<String, WarmEntry<V>>>,
    l3: Mutex<LruCache<String, WarmEntry<V>>>,
    promotion_threshold: u32,
    stats: Mutex<CacheStats>,
}

impl<V: Clone + Send + Sync> TieredCache<V> {
    pub fn new(l1_size: usize, l2_size: usize, l3_size: usize, promotion_threshold: u32) -> Self {
        Self {
            l1: Mutex::new(LruCache::new(non_zero(l1_size))),
            l2: Mutex::new(LruCache::new(non_zero(l2_size))),
            l3: Mutex::new(LruCache::new(non_zero(l3_size))),
            promotion_threshold,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_L1_SIZE,
            DEFAULT_L2_SIZE,
            DEFAULT_L3_SIZE,
            DEFAULT_PROMOTION_THRESHOLD,
        )
    }

    fn insert_warm(
        &self,
        target: &Mutex<LruCache<String, WarmEntry<V>>>,
        spillover: &Mutex<LruCache<String, WarmEntry<V>>>,
        key: String,
        value: V,
    ) {
        let evicted = target.lock().unwrap().push(
            key,
            WarmEntry {
                value,
                accesses: 0,
            },
        );
        if let Some((ek, ev)) = evicted {
            let mut stats = self.stats.lock().unwrap();
            stats.evictions += 1;
            drop(stats);
            spillover.lock().unwrap().push(ek, ev);
        }
    }

    fn insert_cold(&self, key: String, value: V) {
        let evicted = self.l3.lock().unwrap().push(
            key,
            WarmEntry {
                value,
                accesses: 0,
            },
        );
        if evicted.is_some() {
            self.stats.lock().unwrap().evictions += 1;
        }
    }

    fn promote_into_l1(&self, key: String, value: V) {
        let evicted = self.l1.lock().unwrap().push(key, value);
        if let Some((ek, ev)) = evicted {
            self.insert_warm(&self.l2, &self.l3, ek, ev);
        }
    }

    fn promote_into_l2(&self, key: String, value: V) {
        let evicted = self.l2.lock().unwrap().push(
            key,
            WarmEntry {
                value,
                accesses: 0,
            },
        );
        if let Some((ek, ev)) = evicted {
            self.l3.lock().unwrap().push(ek, ev);
        }
    }
}

fn non_zero(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size.max(1)).expect("size clamped to at least 1")
}

#[async_trait]
impl<V: Clone + Send + Sync> CacheBackend<V> for TieredCache<V> {
    async fn get(&self, key: &str) -> Option<V> {
        if let Some(v) = self.l1.lock().unwrap().get(key).cloned() {
            self.stats.lock().unwrap().hits += 1;
            return Some(v);
        }

        let l2_hit = {
            let mut l2 = self.l2.lock().unwrap();
            l2.get_mut(key).map(|entry| {
                entry.accesses += 1;
                (entry.value.clone(), entry.accesses > self.promotion_threshold)
            })
        };
        if let Some((value, promote)) = l2_hit {
            self.stats.lock().unwrap().hits += 1;
            if promote {
                self.l2.lock().unwrap().pop(key);
                self.promote_into_l1(key.to_string(), value.clone());
            }
            return Some(value);
        }

        let l3_hit = {
            let mut l3 = self.l3.lock().unwrap();
            l3.get_mut(key).map(|entry| {
                entry.accesses += 1;
                (entry.value.clone(), entry.accesses > self.promotion_threshold)
            })
        };
        if let Some((value, promote)) = l3_hit {
            self.stats.lock().unwrap().hits += 1;
            if promote {
                self.l3.lock().unwrap().pop(key);
                self.promote_into_l2(key.to_string(), value.clone());
            }
            return Some(value);
        }

        self.stats.lock().unwrap().misses += 1;
        None
    }

    async fn put(&self, key: String, value: V) {
        self.insert_warm(&self.l2, &self.l3, key, value);
    }

    async fn put_in_tier(&self, key: String, value: V, tier: Tier) {
        match tier {
            Tier::Hot => self.promote_into_l1(key, value),
            Tier::Warm => self.insert_warm(&self.l2, &self.l3, key, value),
            Tier::Cold => self.insert_cold(key, value),
        }
    }

    async fn evict(&self, key: &str) -> Option<V> {
        if let Some(v) = self.l1.lock().unwrap().pop(key) {
            return Some(v);
        }
        if let Some(entry) = self.l2.lock().unwrap().pop(key) {
            return Some(entry.value);
        }
        self.l3.lock().unwrap().pop(key).map(|entry| entry.value)
    }

    async fn clear(&self) {
        self.l1.lock().unwrap().clear();
        self.l2.lock().unwrap().clear();
        self.l3.lock().unwrap().clear();
    }

    async fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.lock().unwrap();
        stats.entry_count = self.l1.lock().unwrap().len()
            + self.l2.lock().unwrap().len()
            + self.l3.lock().unwrap().len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache() -> TieredCache<i32> {
        TieredCache::new(2, 2, 2, 2)
    }

    #[tokio::test]
    async fn put_lands_in_warm_tier_and_is_retrievable() {
        let cache = small_cache();
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.get("a").await, Some(1));
    }

    #[tokio::test]
    async fn repeated_hits_promote_to_hotter_tier() {
        let cache = small_cache();
        cache.put("a".to_string(), 1).await;
        for _ in 0..3 {
            cache.get("a").await;
        }
        assert_eq!(cache.l1.lock().unwrap().peek("a"), Some(&1));
    }

    #[tokio::test]
    async fn miss_increments_miss_counter() {
        let cache = small_cache();
        assert_eq!(cache.get("missing").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn evict_removes_from_whichever_tier_holds_it() {
        let cache = small_cache();
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.evict("a").await, Some(1));
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn cold_tier_insert_does_not_touch_hotter_tiers() {
        let cache = small_cache();
        cache.put_in_tier("a".to_string(), 1, Tier::Cold).await;
        assert_eq!(cache.l1.lock().unwrap().peek("a"), None);
        assert_eq!(cache.get("a").await, Some(1));
    }

    #[tokio::test]
    async fn clear_empties_every_tier() {
        let cache = small_cache();
        cache.put("a".to_string(), 1).await;
        cache.clear().await;
        assert_eq!(cache.get("a").await, None);
    }
}
