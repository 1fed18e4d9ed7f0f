//! REST API route modules.

pub mod chat;
pub mod decks;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Assemble the full API router: chat, deck CRUD, and health, all sharing
/// one [`AppState`].
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(chat::create_router())
        .merge(decks::create_router())
        .merge(health::create_router())
}
