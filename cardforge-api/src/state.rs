//! Shared application state for Axum routers: the card repository, LLM
//! provider registry, deck store, and FSM orchestrator, plus the resolved
//! configuration each was built from.

use std::sync::Arc;

use cardforge_engine::{CardRepository, Orchestrator};
use cardforge_llm::ProviderRegistry;
use cardforge_storage::DeckStore;

use crate::config::AppConfig;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<CardRepository>,
    pub llm: Arc<ProviderRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub deck_store: Arc<dyn DeckStore>,
    pub config: Arc<AppConfig>,
    pub start_time: std::time::Instant,
}

crate::impl_from_ref!(Arc<CardRepository>, repository);
crate::impl_from_ref!(Arc<ProviderRegistry>, llm);
crate::impl_from_ref!(Arc<Orchestrator>, orchestrator);
crate::impl_from_ref!(Arc<AppConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
