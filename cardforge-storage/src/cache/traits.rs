//! Cache trait contract shared by the tiered and single-tier implementations.
//!
//! A plain string-keyed `get`/`put`/`delete`/`stats` contract: cache values
//! here are catalog records, so there is no marker trait to implement per
//! value type.

use async_trait::async_trait;

use super::tiered::Tier;

/// Bounded cache keyed by string, storing an arbitrary cloneable value.
#[async_trait]
pub trait CacheBackend<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<V>;

    async fn put(&self, key: String, value: V);

    /// Insert into a specific tier rather than the default write tier.
    /// Single-tier implementations ignore `tier` and behave like `put`.
    async fn put_in_tier(&self, key: String, value: V, tier: Tier);

    async fn evict(&self, key: &str) -> Option<V>;

    async fn clear(&self);

    async fn stats(&self) -> CacheStats;
}

/// Cumulative cache statistics. Counters only grow; callers compute rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, in `[0.0, 1.0]`. `0.0` with no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_zero_with_no_lookups() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_computed_from_hits_and_misses() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entry_count: 2,
            evictions: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
    }
}
