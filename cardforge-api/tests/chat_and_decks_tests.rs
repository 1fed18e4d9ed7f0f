//! End-to-end HTTP tests driving the full router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cardforge_api::{AppConfig, AppState};
use cardforge_engine::Orchestrator;
use cardforge_llm::ProviderRegistry;
use cardforge_storage::{DeckStore, InMemoryDeckStore};
use cardforge_test_utils::{in_memory_repository, mock_registry};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_state(responses: Vec<Value>) -> AppState {
    let llm: Arc<ProviderRegistry> = mock_registry(responses).await;
    let repository = in_memory_repository(llm.clone());
    let orchestrator = Arc::new(Orchestrator::new(repository.clone(), llm.clone()).with_bounds(0.0, 5));
    let deck_store: Arc<dyn DeckStore> = Arc::new(InMemoryDeckStore::new());
    AppState {
        repository,
        llm,
        orchestrator,
        deck_store,
        config: Arc::new(AppConfig::default()),
        start_time: std::time::Instant::now(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let state = test_state(vec![]).await;
    let app = cardforge_api::create_api_router().with_state(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["status"], "healthy");
}

#[tokio::test]
async fn chat_builds_standard_red_aggro_deck() {
    let construction_plan = json!({
        "strategy": "Aggressive red burn",
        "card_selections": [
            {"card_name": "Lightning Bolt", "quantity": 4, "reasoning": "efficient removal"},
            {"card_name": "Goblin Guide", "quantity": 4, "reasoning": "fast clock"}
        ]
    });
    let state = test_state(vec![construction_plan]).await;
    let app = cardforge_api::create_api_router().with_state(state);

    let body = json!({
        "message": "Build a Standard red aggro deck",
        "context": {"quality_threshold": 0.0}
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;

    assert_eq!(payload["success"], true);
    assert_eq!(payload["deck"]["format"], "Standard");
    let archetype = payload["deck"]["archetype"].as_str().unwrap().to_lowercase();
    assert_eq!(archetype, "aggro");
    assert_eq!(payload["deck"]["total_cards"], 60);
    let colors: Vec<String> = payload["deck"]["colors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(colors.contains(&"R".to_string()));
    assert!(payload["message"].as_str().unwrap().contains("Quality Score: "));
}

#[tokio::test]
async fn chat_builds_commander_singleton_deck() {
    let construction_plan = json!({
        "strategy": "Blue control shell",
        "card_selections": [
            {"card_name": "Counterspell", "quantity": 1, "reasoning": "tempo"}
        ]
    });
    let state = test_state(vec![construction_plan]).await;
    let app = cardforge_api::create_api_router().with_state(state);

    let body = json!({
        "message": "Build a Commander U deck",
        "context": {"quality_threshold": 0.0}
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;

    assert_eq!(payload["deck"]["format"], "Commander");
    assert_eq!(payload["deck"]["total_cards"], 100);
    for card in payload["deck"]["cards"].as_array().unwrap() {
        let name = card["card"]["name"].as_str().unwrap();
        let quantity = card["quantity"].as_u64().unwrap();
        let is_basic = ["Plains", "Island", "Swamp", "Mountain", "Forest"].contains(&name);
        if !is_basic {
            assert_eq!(quantity, 1, "{name} should be capped at 1 copy in a singleton format");
        }
    }
}

#[tokio::test]
async fn save_then_get_deck_round_trips() {
    let state = test_state(vec![]).await;
    let app = cardforge_api::create_api_router().with_state(state);

    let deck = cardforge_test_utils::sample_deck(cardforge_core::Format::Standard, cardforge_core::Archetype::Aggro);
    let save_body = json!({ "deck": deck, "quality_score": 0.8 });
    let save_request = Request::builder()
        .method("POST")
        .uri("/api/decks")
        .header("content-type", "application/json")
        .body(Body::from(save_body.to_string()))
        .unwrap();
    let save_response = app.clone().oneshot(save_request).await.unwrap();
    assert_eq!(save_response.status(), StatusCode::OK);
    let save_payload = body_json(save_response).await;
    let deck_id = save_payload["deck_id"].as_str().unwrap().to_string();

    let get_request = Request::builder()
        .uri(format!("/api/decks/{deck_id}"))
        .body(Body::empty())
        .unwrap();
    let get_response = app.oneshot(get_request).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
    let get_payload = body_json(get_response).await;
    assert_eq!(get_payload["quality_score"], 0.8);
}

#[tokio::test]
async fn get_unknown_deck_returns_404() {
    let state = test_state(vec![]).await;
    let app = cardforge_api::create_api_router().with_state(state);

    let unknown_id = cardforge_core::DeckId::now_v7();
    let request = Request::builder()
        .uri(format!("/api/decks/{unknown_id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
