//! `POST /api/chat`: the single conversational endpoint. Absence of
//! `existing_deck` routes to the new-deck construction flow; its presence
//! routes to the modification flow. Routing is deterministic on request
//! shape, never guessed from message content.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cardforge_core::{Archetype, Color, Deck, Format};
use cardforge_engine::{BuildOutcome, ModifyOutcome, OrchestrationRequest, OrchestratorOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn default_run_quality_check() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub existing_deck: Option<Deck>,
    /// Only consulted on a modify request; skips the post-modification
    /// quality analysis when `false`. Defaults to `true`.
    #[serde(default = "default_run_quality_check")]
    pub run_quality_check: bool,
}

#[derive(Debug, Serialize)]
pub struct DeckView {
    pub cards: Vec<cardforge_core::DeckCard>,
    pub format: Format,
    pub archetype: Archetype,
    pub colors: Vec<String>,
    pub total_cards: u32,
}

impl From<&Deck> for DeckView {
    fn from(deck: &Deck) -> Self {
        Self {
            cards: deck.cards.clone(),
            format: deck.format,
            archetype: deck.archetype,
            colors: deck.color_identity().to_letters().chars().map(|c| c.to_string()).collect(),
            total_cards: deck.total_cards(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub deck: DeckView,
    pub error: Option<String>,
}

fn detect_colors(text: &str) -> Color {
    let mut colors = Color::empty();
    for word in text.split_whitespace() {
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        if let Some(color) = Color::from_word(trimmed) {
            colors |= color;
        }
    }
    if colors.is_empty() {
        Color::RED
    } else {
        colors
    }
}

fn context_f32(context: &Option<Value>, key: &str) -> Option<f32> {
    context.as_ref()?.get(key)?.as_f64().map(|v| v as f32)
}

fn context_u32(context: &Option<Value>, key: &str) -> Option<u32> {
    context.as_ref()?.get(key)?.as_u64().map(|v| v as u32)
}

pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> ApiResult<Json<ChatResponse>> {
    let quality_threshold = context_f32(&request.context, "quality_threshold").unwrap_or(state.config.quality_threshold);
    let max_iterations = context_u32(&request.context, "max_iterations").unwrap_or(state.config.max_iterations);
    let orchestrator = state.orchestrator.as_ref();

    if let Some(existing_deck) = request.existing_deck {
        let orchestration_request = OrchestrationRequest::Modify {
            deck: existing_deck,
            user_prompt: request.message.clone(),
            run_quality_check: request.run_quality_check,
        };
        let outcome = orchestrator.run(orchestration_request).await?;
        let OrchestratorOutcome::Modify(ModifyOutcome { deck, execution }) = outcome else {
            return Err(ApiError::internal("orchestrator returned a build outcome for a modify request"));
        };

        let message = match &execution.quality {
            Some(metrics) => format!(
                "Applied {:?} modification. Quality Score: {:.2}",
                execution.intent.intent_type, metrics.overall
            ),
            None => format!("Applied {:?} modification.", execution.intent.intent_type),
        };

        return Ok(Json(ChatResponse { success: true, message, deck: DeckView::from(&deck), error: None }));
    }

    let format = Format::detect_in_text(&request.message).unwrap_or(Format::Standard);
    let archetype = Archetype::detect_in_text(&request.message).unwrap_or(Archetype::Aggro);
    let colors = detect_colors(&request.message);

    let name = format!("{:?} {:?} deck", format, archetype);
    let orchestration_request = OrchestrationRequest::NewDeck { name, format, archetype, colors };

    let bounded = cardforge_engine::Orchestrator::new(state.repository.clone(), state.llm.clone())
        .with_bounds(quality_threshold, max_iterations);
    let outcome = bounded.run(orchestration_request).await?;
    let OrchestratorOutcome::Build(BuildOutcome { deck, quality, iteration_state }) = outcome else {
        return Err(ApiError::internal("orchestrator returned a modify outcome for a new-deck request"));
    };

    let message = format!(
        "Built a {format:?} {archetype:?} deck. Quality Score: {:.2} after {} iteration(s).",
        quality.overall,
        iteration_state.history.len()
    );

    Ok(Json(ChatResponse { success: true, message, deck: DeckView::from(&deck), error: None }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_colors_defaults_to_red() {
        assert_eq!(detect_colors("build me a deck"), Color::RED);
    }

    #[test]
    fn detect_colors_finds_multiple_words() {
        let colors = detect_colors("Build a Commander blue white deck");
        assert!(colors.contains(Color::BLUE));
        assert!(colors.contains(Color::WHITE));
        assert!(!colors.contains(Color::RED));
    }

    #[test]
    fn context_overrides_parse_as_f32_and_u32() {
        let context = Some(serde_json::json!({ "quality_threshold": 0.85, "max_iterations": 3 }));
        assert_eq!(context_f32(&context, "quality_threshold"), Some(0.85));
        assert_eq!(context_u32(&context, "max_iterations"), Some(3));
    }
}
