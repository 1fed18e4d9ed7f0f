//! Semantic search over card embeddings.

use async_trait::async_trait;
use cardforge_core::{CardId, CardforgeResult, EmbeddingVector, Format};
use dashmap::DashMap;
use serde_json::Value;

/// Narrow filter applied during a semantic search. Deliberately smaller than
/// the catalog store's full filter set — the vector index only knows what
/// it was told to echo back into `metadata` at upsert time.
#[derive(Debug, Clone, Default)]
pub struct VectorSearchFilters {
    pub format: Option<Format>,
}

/// One indexed card: its embedding plus whatever metadata the caller wants
/// echoed back alongside search hits (name, colors, etc. — kept as a JSON
/// blob so the index itself stays agnostic of the catalog schema).
#[derive(Debug, Clone)]
pub struct IndexedCard {
    pub card_id: CardId,
    pub embedding: EmbeddingVector,
    pub metadata: Value,
}

/// A single semantic search hit.
#[derive(Debug, Clone)]
pub struct VectorSearchHit {
    pub card_id: CardId,
    pub distance: f32,
    pub metadata: Value,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace embeddings for the given cards. Returns the number
    /// upserted.
    async fn upsert(&self, cards: Vec<IndexedCard>) -> CardforgeResult<usize>;

    /// Embed `query_text` via the caller-supplied embedder and return the
    /// `k` nearest cards by cosine similarity, restricted to `filters` when
    /// given.
    async fn search(
        &self,
        query_embedding: &EmbeddingVector,
        k: usize,
        filters: Option<&VectorSearchFilters>,
    ) -> CardforgeResult<Vec<VectorSearchHit>>;

    async fn count(&self) -> usize;
}

/// In-process vector index, linear-scanned. Adequate for a catalog sized for
/// a single-node deployment; no approximate-nearest-neighbor structure is
/// built since exactness matters more than query latency at this scale.
#[derive(Default)]
pub struct InProcessVectorIndex {
    entries: DashMap<CardId, IndexedCard>,
}

impl InProcessVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InProcessVectorIndex {
    async fn upsert(&self, cards: Vec<IndexedCard>) -> CardforgeResult<usize> {
        let count = cards.len();
        for card in cards {
            self.entries.insert(card.card_id, card);
        }
        Ok(count)
    }

    async fn search(
        &self,
        query_embedding: &EmbeddingVector,
        k: usize,
        filters: Option<&VectorSearchFilters>,
    ) -> CardforgeResult<Vec<VectorSearchHit>> {
        let mut scored = Vec::new();
        for entry in self.entries.iter() {
            let card = entry.value();
            if let Some(filters) = filters {
                if !metadata_matches(&card.metadata, filters) {
                    continue;
                }
            }
            let similarity = card.embedding.cosine_similarity(query_embedding)?;
            scored.push(VectorSearchHit {
                card_id: card.card_id,
                // Distance, not similarity: smaller is closer.
                distance: 1.0 - similarity,
                metadata: card.metadata.clone(),
            });
        }
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> usize {
        self.entries.len()
    }
}

/// Minimal metadata filter: matches against a `"format"` field when the
/// caller asked for one. Broader filtering belongs to the catalog store,
/// which owns the full schema; the vector index only narrows by what it was
/// told to echo back at upsert time.
fn metadata_matches(metadata: &Value, filters: &VectorSearchFilters) -> bool {
    if let Some(format) = filters.format {
        let legal = metadata
            .get("legalities")
            .and_then(|v| v.get(format.as_db_str()))
            .and_then(|v| v.as_bool());
        if legal == Some(false) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{CardId, EntityIdType};
    use serde_json::json;

    fn vec3(data: [f32; 3]) -> EmbeddingVector {
        EmbeddingVector::new(data.to_vec(), "test".to_string())
    }

    #[tokio::test]
    async fn upsert_then_search_returns_k_nearest() {
        let index = InProcessVectorIndex::new();
        let a = IndexedCard { card_id: CardId::new_v4(), embedding: vec3([1.0, 0.0, 0.0]), metadata: json!({}) };
        let b = IndexedCard { card_id: CardId::new_v4(), embedding: vec3([0.0, 1.0, 0.0]), metadata: json!({}) };
        index.upsert(vec![a.clone(), b.clone()]).await.unwrap();

        let hits = index.search(&vec3([1.0, 0.0, 0.0]), 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].card_id, a.card_id);
        assert!(hits[0].distance < 0.01);
    }

    #[tokio::test]
    async fn count_reflects_upserts() {
        let index = InProcessVectorIndex::new();
        assert_eq!(index.count().await, 0);
        index
            .upsert(vec![IndexedCard { card_id: CardId::new_v4(), embedding: vec3([1.0, 0.0, 0.0]), metadata: json!({}) }])
            .await
            .unwrap();
        assert_eq!(index.count().await, 1);
    }
}
