//! Cardforge Storage - Catalog Store, Deck Store, and Cache
//!
//! Persistence layer for the card catalog and constructed decks, plus the
//! tiered/single-tier cache that sits in front of the catalog store.

pub mod cache;
pub mod catalog;
pub mod deck_store;

pub use cache::{CacheBackend, CacheStats, SingleTierCache, Tier, TieredCache};
pub use catalog::{
    CardSearchFilters, CatalogDbConfig, CatalogStore, ColorMatchMode, InMemoryCatalogStore,
    PostgresCatalogStore,
};
pub use deck_store::{
    DeckListFilters, DeckRecord, DeckStore, DeckUpdate, InMemoryDeckStore, PostgresDeckStore,
};
