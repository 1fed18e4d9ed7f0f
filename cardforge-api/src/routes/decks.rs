//! Deck persistence endpoints: save, list, fetch, update, delete.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use cardforge_core::{Archetype, Deck, DeckId, Format};
use cardforge_storage::{DeckListFilters, DeckRecord, DeckUpdate};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveDeckRequest {
    pub deck: Deck,
    #[serde(default)]
    pub quality_score: f32,
    #[serde(default)]
    pub improvement_notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveDeckResponse {
    pub success: bool,
    pub deck_id: DeckId,
}

async fn save_deck(State(state): State<AppState>, Json(request): Json<SaveDeckRequest>) -> ApiResult<Json<SaveDeckResponse>> {
    let record = DeckRecord::from_deck(request.deck, request.quality_score, request.improvement_notes, request.user_id);
    let deck_id = state.deck_store.save(record).await?;
    Ok(Json(SaveDeckResponse { success: true, deck_id }))
}

#[derive(Debug, Deserialize)]
pub struct ListDecksQuery {
    pub format: Option<String>,
    pub archetype: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct ListDecksResponse {
    pub success: bool,
    pub decks: Vec<DeckRecordView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeckRecordView {
    pub id: DeckId,
    pub name: String,
    pub format: Format,
    pub archetype: Archetype,
    pub total_cards: u32,
    pub quality_score: f32,
    pub created_at: cardforge_core::Timestamp,
    pub updated_at: cardforge_core::Timestamp,
}

impl From<DeckRecord> for DeckRecordView {
    fn from(record: DeckRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            format: record.format,
            archetype: record.archetype,
            total_cards: record.total_cards,
            quality_score: record.quality_score,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

async fn list_decks(State(state): State<AppState>, Query(query): Query<ListDecksQuery>) -> ApiResult<Json<ListDecksResponse>> {
    let limit = query.limit.clamp(1, 1000);
    let filters = DeckListFilters {
        format: query.format.as_deref().and_then(|s| Format::from_db_str(s).ok()),
        archetype: query.archetype.as_deref().and_then(|s| Archetype::from_db_str(s).ok()),
        user_id: None,
    };
    let records = state.deck_store.list(&filters, limit, query.offset).await?;
    let total = state.deck_store.count(&filters).await?;
    Ok(Json(ListDecksResponse {
        success: true,
        decks: records.into_iter().map(DeckRecordView::from).collect(),
        total,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeckDetailResponse {
    pub success: bool,
    pub deck: Deck,
    pub quality_score: f32,
    pub improvement_notes: Option<String>,
}

async fn get_deck(State(state): State<AppState>, Path(id): Path<DeckId>) -> ApiResult<Json<DeckDetailResponse>> {
    let record = state
        .deck_store
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("deck {id} not found")))?;
    Ok(Json(DeckDetailResponse {
        success: true,
        deck: record.body,
        quality_score: record.quality_score,
        improvement_notes: record.improvement_notes,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeckRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deck: Option<Deck>,
    #[serde(default)]
    pub quality_score: Option<f32>,
    #[serde(default)]
    pub improvement_notes: Option<String>,
}

async fn update_deck(
    State(state): State<AppState>,
    Path(id): Path<DeckId>,
    Json(request): Json<UpdateDeckRequest>,
) -> ApiResult<Json<DeckDetailResponse>> {
    let update = DeckUpdate {
        name: request.name,
        description: request.description,
        body: request.deck,
        quality_score: request.quality_score,
        improvement_notes: request.improvement_notes,
    };
    let record = state.deck_store.update(id, update).await.map_err(|err| {
        if err.kind() == cardforge_core::ErrorKind::NotFound {
            ApiError::not_found(format!("deck {id} not found"))
        } else {
            err.into()
        }
    })?;
    Ok(Json(DeckDetailResponse {
        success: true,
        deck: record.body,
        quality_score: record.quality_score,
        improvement_notes: record.improvement_notes,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteDeckResponse {
    pub success: bool,
}

async fn delete_deck(State(state): State<AppState>, Path(id): Path<DeckId>) -> ApiResult<Json<DeleteDeckResponse>> {
    state.deck_store.delete(id).await.map_err(|err| {
        if err.kind() == cardforge_core::ErrorKind::NotFound {
            ApiError::not_found(format!("deck {id} not found"))
        } else {
            err.into()
        }
    })?;
    Ok(Json(DeleteDeckResponse { success: true }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/decks", post(save_deck).get(list_decks))
        .route("/api/decks/:id", get(get_deck).put(update_deck).delete(delete_deck))
}
