//! Cardforge API - REST layer for the deck-construction service.
//!
//! Exposes a minimal JSON surface over the engine's FSM orchestrator: a
//! unified chat endpoint for building and modifying decks, deck CRUD, and a
//! liveness probe.

pub mod config;
pub mod error;
pub mod macros;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
