//! Deck store: CRUD persistence for completed decks.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cardforge_core::{
    Archetype, CardforgeError, CardforgeResult, Color, Deck, DeckId, Format, StorageError, Timestamp,
};
use deadpool_postgres::Pool;

use crate::catalog::CatalogDbConfig;

/// A persisted deck record. Distinct from [`Deck`]: carries the store-level
/// bookkeeping fields (quality score, improvement notes, owning user) that
/// the orchestrator's in-memory `Deck` doesn't need to know about.
#[derive(Debug, Clone)]
pub struct DeckRecord {
    pub id: DeckId,
    pub name: String,
    pub description: Option<String>,
    pub format: Format,
    pub archetype: Archetype,
    pub colors: Color,
    pub body: Deck,
    pub quality_score: f32,
    pub improvement_notes: Option<String>,
    pub total_cards: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub user_id: Option<String>,
}

impl DeckRecord {
    pub fn from_deck(deck: Deck, quality_score: f32, improvement_notes: Option<String>, user_id: Option<String>) -> Self {
        let now = cardforge_core::now();
        Self {
            id: deck.id,
            name: deck.name.clone(),
            description: None,
            format: deck.format,
            archetype: deck.archetype,
            colors: deck.color_identity(),
            total_cards: deck.total_cards(),
            body: deck,
            quality_score,
            improvement_notes,
            created_at: now,
            updated_at: now,
            user_id,
        }
    }
}

/// Partial update applied to a stored deck. `None` fields are left
/// unchanged; `updated_at` is always refreshed, `created_at` never changes.
#[derive(Debug, Clone, Default)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub body: Option<Deck>,
    pub quality_score: Option<f32>,
    pub improvement_notes: Option<String>,
}

/// Filters accepted by [`DeckStore::list`]/[`DeckStore::count`].
#[derive(Debug, Clone, Default)]
pub struct DeckListFilters {
    pub format: Option<Format>,
    pub archetype: Option<Archetype>,
    pub user_id: Option<String>,
}

impl DeckListFilters {
    fn matches(&self, record: &DeckRecord) -> bool {
        if let Some(format) = self.format {
            if record.format != format {
                return false;
            }
        }
        if let Some(archetype) = self.archetype {
            if record.archetype != archetype {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if record.user_id.as_deref() != Some(user_id.as_str()) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait DeckStore: Send + Sync {
    async fn save(&self, record: DeckRecord) -> CardforgeResult<DeckId>;
    async fn get_by_id(&self, id: DeckId) -> CardforgeResult<Option<DeckRecord>>;
    async fn list(&self, filters: &DeckListFilters, limit: usize, offset: usize) -> CardforgeResult<Vec<DeckRecord>>;
    async fn update(&self, id: DeckId, update: DeckUpdate) -> CardforgeResult<DeckRecord>;
    async fn delete(&self, id: DeckId) -> CardforgeResult<()>;
    async fn count(&self, filters: &DeckListFilters) -> CardforgeResult<usize>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================================

/// `HashMap<DeckId, DeckRecord>`-backed store for tests.
#[derive(Default)]
pub struct InMemoryDeckStore {
    decks: RwLock<HashMap<DeckId, DeckRecord>>,
}

impl InMemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeckStore for InMemoryDeckStore {
    async fn save(&self, record: DeckRecord) -> CardforgeResult<DeckId> {
        let id = record.id;
        let mut decks = self
            .decks
            .write()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        decks.insert(id, record);
        Ok(id)
    }

    async fn get_by_id(&self, id: DeckId) -> CardforgeResult<Option<DeckRecord>> {
        let decks = self
            .decks
            .read()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        Ok(decks.get(&id).cloned())
    }

    async fn list(&self, filters: &DeckListFilters, limit: usize, offset: usize) -> CardforgeResult<Vec<DeckRecord>> {
        let decks = self
            .decks
            .read()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        let mut matches: Vec<DeckRecord> = decks
            .values()
            .filter(|r| filters.matches(r))
            .cloned()
            .collect();
        matches.sort_by_key(|r| r.created_at);
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, id: DeckId, update: DeckUpdate) -> CardforgeResult<DeckRecord> {
        let mut decks = self
            .decks
            .write()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        let record = decks
            .get_mut(&id)
            .ok_or_else(|| CardforgeError::Storage(StorageError::DeckNotFound(id.to_string())))?;

        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = Some(description);
        }
        if let Some(body) = update.body {
            record.colors = body.color_identity();
            record.total_cards = body.total_cards();
            record.body = body;
        }
        if let Some(quality_score) = update.quality_score {
            record.quality_score = quality_score;
        }
        if let Some(notes) = update.improvement_notes {
            record.improvement_notes = Some(notes);
        }
        record.updated_at = cardforge_core::now();

        Ok(record.clone())
    }

    async fn delete(&self, id: DeckId) -> CardforgeResult<()> {
        let mut decks = self
            .decks
            .write()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        decks
            .remove(&id)
            .ok_or_else(|| CardforgeError::Storage(StorageError::DeckNotFound(id.to_string())))?;
        Ok(())
    }

    async fn count(&self, filters: &DeckListFilters) -> CardforgeResult<usize> {
        let decks = self
            .decks
            .read()
            .map_err(|_| CardforgeError::Storage(StorageError::LockPoisoned))?;
        Ok(decks.values().filter(|r| filters.matches(r)).count())
    }
}

// ============================================================================
// POSTGRES IMPLEMENTATION
// ============================================================================

/// Same `deadpool-postgres`/`tokio-postgres` pooling convention as
/// [`crate::catalog::PostgresCatalogStore`].
pub struct PostgresDeckStore {
    pool: Pool,
}

impl PostgresDeckStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &CatalogDbConfig) -> CardforgeResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    async fn conn(&self) -> CardforgeResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            CardforgeError::Storage(StorageError::Unavailable {
                reason: format!("deck pool exhausted: {e}"),
            })
        })
    }

    fn row_to_record(row: &tokio_postgres::Row) -> CardforgeResult<DeckRecord> {
        let body_json: serde_json::Value = row.get("body");
        let body: Deck = serde_json::from_value(body_json).map_err(|e| {
            CardforgeError::Storage(StorageError::IndexError {
                index_name: "body".to_string(),
                reason: e.to_string(),
            })
        })?;
        let format_str: String = row.get("format");
        let archetype_str: String = row.get("archetype");
        let colors_bits: i16 = row.get("colors");

        Ok(DeckRecord {
            id: body.id,
            name: row.get("name"),
            description: row.get("description"),
            format: Format::from_db_str(&format_str).map_err(|e| {
                CardforgeError::Storage(StorageError::IndexError {
                    index_name: "format".to_string(),
                    reason: e.to_string(),
                })
            })?,
            archetype: Archetype::from_db_str(&archetype_str).map_err(|e| {
                CardforgeError::Storage(StorageError::IndexError {
                    index_name: "archetype".to_string(),
                    reason: e.to_string(),
                })
            })?,
            colors: Color::from_bits_truncate(colors_bits as u8),
            body,
            quality_score: row.get("quality_score"),
            improvement_notes: row.get("improvement_notes"),
            total_cards: {
                let n: i32 = row.get("total_cards");
                n as u32
            },
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            user_id: row.get("user_id"),
        })
    }
}

#[async_trait]
impl DeckStore for PostgresDeckStore {
    async fn save(&self, record: DeckRecord) -> CardforgeResult<DeckId> {
        let conn = self.conn().await?;
        let body_json = serde_json::to_value(&record.body).map_err(|e| {
            CardforgeError::Storage(StorageError::InsertFailed {
                reason: e.to_string(),
            })
        })?;
        conn.execute(
            "INSERT INTO decks (id, name, description, format, archetype, colors, body, \
             quality_score, improvement_notes, total_cards, created_at, updated_at, user_id) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
            &[
                &record.id.to_string(),
                &record.name,
                &record.description,
                &record.format.as_db_str(),
                &record.archetype.as_db_str(),
                &(record.colors.bits() as i16),
                &body_json,
                &record.quality_score,
                &record.improvement_notes,
                &(record.total_cards as i32),
                &record.created_at,
                &record.updated_at,
                &record.user_id,
            ],
        )
        .await
        .map_err(|e| {
            CardforgeError::Storage(StorageError::InsertFailed {
                reason: e.to_string(),
            })
        })?;
        Ok(record.id)
    }

    async fn get_by_id(&self, id: DeckId) -> CardforgeResult<Option<DeckRecord>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT * FROM decks WHERE id = $1", &[&id.to_string()])
            .await
            .map_err(|e| {
                CardforgeError::Storage(StorageError::Unavailable {
                    reason: e.to_string(),
                })
            })?;
        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    async fn list(&self, filters: &DeckListFilters, limit: usize, offset: usize) -> CardforgeResult<Vec<DeckRecord>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT * FROM decks ORDER BY created_at ASC",
                &[],
            )
            .await
            .map_err(|e| {
                CardforgeError::Storage(StorageError::Unavailable {
                    reason: e.to_string(),
                })
            })?;

        let mut out = Vec::new();
        for row in rows.iter().skip(offset) {
            if out.len() >= limit {
                break;
            }
            let record = Self::row_to_record(row)?;
            if filters.matches(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn update(&self, id: DeckId, update: DeckUpdate) -> CardforgeResult<DeckRecord> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CardforgeError::Storage(StorageError::DeckNotFound(id.to_string())))?;

        let mut merged = existing;
        if let Some(name) = update.name {
            merged.name = name;
        }
        if let Some(description) = update.description {
            merged.description = Some(description);
        }
        if let Some(body) = update.body {
            merged.colors = body.color_identity();
            merged.total_cards = body.total_cards();
            merged.body = body;
        }
        if let Some(quality_score) = update.quality_score {
            merged.quality_score = quality_score;
        }
        if let Some(notes) = update.improvement_notes {
            merged.improvement_notes = Some(notes);
        }
        merged.updated_at = cardforge_core::now();

        let conn = self.conn().await?;
        let body_json = serde_json::to_value(&merged.body).map_err(|e| {
            CardforgeError::Storage(StorageError::UpdateFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
        })?;
        let rows_affected = conn
            .execute(
                "UPDATE decks SET name=$2, description=$3, body=$4, quality_score=$5, \
                 improvement_notes=$6, total_cards=$7, updated_at=$8, colors=$9 WHERE id=$1",
                &[
                    &id.to_string(),
                    &merged.name,
                    &merged.description,
                    &body_json,
                    &merged.quality_score,
                    &merged.improvement_notes,
                    &(merged.total_cards as i32),
                    &merged.updated_at,
                    &(merged.colors.bits() as i16),
                ],
            )
            .await
            .map_err(|e| {
                CardforgeError::Storage(StorageError::UpdateFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            })?;

        if rows_affected == 0 {
            return Err(CardforgeError::Storage(StorageError::DeckNotFound(id.to_string())));
        }
        Ok(merged)
    }

    async fn delete(&self, id: DeckId) -> CardforgeResult<()> {
        let conn = self.conn().await?;
        let rows_affected = conn
            .execute("DELETE FROM decks WHERE id = $1", &[&id.to_string()])
            .await
            .map_err(|e| {
                CardforgeError::Storage(StorageError::Unavailable {
                    reason: e.to_string(),
                })
            })?;
        if rows_affected == 0 {
            return Err(CardforgeError::Storage(StorageError::DeckNotFound(id.to_string())));
        }
        Ok(())
    }

    async fn count(&self, filters: &DeckListFilters) -> CardforgeResult<usize> {
        // No filter pushdown to SQL: filters are small-cardinality enum
        // comparisons, cheap to apply in-process against the full row set,
        // matching the approach taken in `search`.
        let all = self.list(filters, usize::MAX, 0).await?;
        Ok(all.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{Archetype, Deck, Format};

    fn sample_record(name: &str) -> DeckRecord {
        let deck = Deck::new(name, Format::Standard, Archetype::Aggro);
        DeckRecord::from_deck(deck, 0.5, None, Some("user-1".to_string()))
    }

    #[tokio::test]
    async fn save_then_get_roundtrips() {
        let store = InMemoryDeckStore::new();
        let record = sample_record("Mono Red Aggro");
        let id = store.save(record).await.unwrap();
        let fetched = store.get_by_id(id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().name, "Mono Red Aggro");
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_and_preserves_created_at() {
        let store = InMemoryDeckStore::new();
        let record = sample_record("Deck");
        let created_at = record.created_at;
        let id = store.save(record).await.unwrap();

        let updated = store
            .update(
                id,
                DeckUpdate {
                    quality_score: Some(0.9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= created_at);
        assert_eq!(updated.quality_score, 0.9);
    }

    #[tokio::test]
    async fn update_missing_deck_returns_not_found() {
        let store = InMemoryDeckStore::new();
        let result = store.update(DeckId::now_v7(), DeckUpdate::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_removes_deck() {
        let store = InMemoryDeckStore::new();
        let id = store.save(sample_record("Deck")).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_format_and_respects_limit_offset() {
        let store = InMemoryDeckStore::new();
        for i in 0..3 {
            store.save(sample_record(&format!("Deck {i}"))).await.unwrap();
        }
        let filters = DeckListFilters {
            format: Some(Format::Standard),
            ..Default::default()
        };
        let page = store.list(&filters, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
    }
}
