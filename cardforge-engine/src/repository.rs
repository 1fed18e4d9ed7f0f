//! Unified card repository: the single facade every other engine component
//! calls through, consulting the cache before the catalog store and
//! degrading semantic search to an empty result (with a warning) rather
//! than masking a catalog outage.

use std::sync::Arc;

use cardforge_core::{Card, CardId, CardforgeResult};
use cardforge_llm::{ProviderRegistry, VectorIndex, VectorSearchFilters};
use cardforge_storage::{CacheBackend, CardSearchFilters, CatalogStore, Tier};

pub struct CardRepository {
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend<Card>>,
    vector_index: Arc<dyn VectorIndex>,
    llm: Arc<ProviderRegistry>,
}

fn name_key(name: &str) -> String {
    format!("card:{}", name.to_lowercase())
}

fn id_key(id: CardId) -> String {
    format!("card_id:{id}")
}

impl CardRepository {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend<Card>>,
        vector_index: Arc<dyn VectorIndex>,
        llm: Arc<ProviderRegistry>,
    ) -> Self {
        Self { catalog, cache, vector_index, llm }
    }

    /// Case-insensitive name lookup, cache-first. Misses are never cached —
    /// only confirmed hits are, so a card added to the catalog after a miss
    /// becomes visible on the next call.
    pub async fn get_by_name(&self, name: &str) -> CardforgeResult<Option<Card>> {
        let key = name_key(name);
        if let Some(card) = self.cache.get(&key).await {
            return Ok(Some(card));
        }
        let found = self.catalog.get_by_name(name).await?;
        if let Some(card) = &found {
            self.cache.put_in_tier(key, card.clone(), Tier::Cold).await;
            self.cache.put_in_tier(id_key(card.id), card.clone(), Tier::Cold).await;
        }
        Ok(found)
    }

    pub async fn get_by_id(&self, id: CardId) -> CardforgeResult<Option<Card>> {
        let key = id_key(id);
        if let Some(card) = self.cache.get(&key).await {
            return Ok(Some(card));
        }
        let found = self.catalog.get_by_id(id).await?;
        if let Some(card) = &found {
            self.cache.put_in_tier(key, card.clone(), Tier::Cold).await;
            self.cache.put_in_tier(name_key(&card.name), card.clone(), Tier::Cold).await;
        }
        Ok(found)
    }

    /// Search results are never cached as a set (the filter combination is
    /// the cache key problem the tiered cache isn't built to solve), but
    /// each hit is opportunistically cached individually for later
    /// name/id lookups.
    pub async fn search(&self, filters: &CardSearchFilters, limit: usize) -> CardforgeResult<Vec<Card>> {
        let results = self.catalog.search(filters, limit).await?;
        for card in &results {
            self.cache.put(name_key(&card.name), card.clone()).await;
            self.cache.put(id_key(card.id), card.clone()).await;
        }
        Ok(results)
    }

    /// Semantic search over card embeddings. A vector-index failure
    /// degrades to an empty result and a `tracing::warn!` — it never masks
    /// a catalog-layer error, since catalog lookups don't go through this
    /// path at all.
    pub async fn semantic_search(
        &self,
        query_text: &str,
        k: usize,
        filters: Option<&VectorSearchFilters>,
    ) -> Vec<Card> {
        let embedding = match self.llm.embed(query_text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(error = %e, "semantic_search: embedding call failed, returning empty result");
                return Vec::new();
            }
        };

        let hits = match self.vector_index.search(&embedding, k, filters).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "semantic_search: vector index search failed, returning empty result");
                return Vec::new();
            }
        };

        let mut cards = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.get_by_id(hit.card_id).await {
                Ok(Some(card)) => cards.push(card),
                Ok(None) => {
                    tracing::warn!(card_id = %hit.card_id, "semantic_search: indexed card missing from catalog");
                }
                Err(e) => {
                    tracing::warn!(error = %e, card_id = %hit.card_id, "semantic_search: catalog lookup failed for hit");
                }
            }
        }
        cards
    }

    /// Load every card from the catalog into the vector index, deriving
    /// embedding text and strategic tags per card. Used at startup and by
    /// any later re-index operation.
    pub async fn preload(&self) -> CardforgeResult<usize> {
        let all = self.catalog.search(&CardSearchFilters::default(), usize::MAX).await?;
        let mut indexed = Vec::with_capacity(all.len());
        for card in &all {
            let tags = cardforge_core::derive_strategic_tags(&card.oracle_text, &card.type_line, &card.subtype_list);
            let text = card.embedding_text(&tags);
            let embedding = match self.llm.embed(&text).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(error = %e, card = %card.name, "preload: embedding failed for card, skipping");
                    continue;
                }
            };
            indexed.push(cardforge_llm::IndexedCard {
                card_id: card.id,
                embedding,
                metadata: serde_json::json!({
                    "name": card.name,
                    "legalities": card.legalities.iter().map(|(f, legal)| (f.as_db_str().to_string(), *legal)).collect::<std::collections::HashMap<_, _>>(),
                }),
            });
        }
        self.vector_index.upsert(indexed).await
    }
}
