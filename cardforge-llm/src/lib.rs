//! Cardforge LLM - Vector Index and Structured-Output Provider Mediation
//!
//! Owns two things every other engine-layer component leans on: the
//! semantic [`VectorIndex`] over card embeddings, and the
//! [`ProviderRegistry`] that mediates every structured-output LLM call
//! (deck construction, refinement, quality improvement, intent
//! classification) through a uniform routing / circuit-breaking / event
//! layer, regardless of which concrete provider answers it.

pub mod circuit;
pub mod mock;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod schemas;
pub mod vector_index;

pub use circuit::{CircuitBreaker, CircuitBreakerConfig};
pub use mock::MockLlmProvider;
pub use provider::{CompletionRequest, ErrorEvent, EventListener, ListenerChain, LlmProvider, RequestEvent, ResponseEvent};
pub use providers::{AnthropicProvider, OpenAiProvider};
pub use registry::{CostTracker, ProviderRegistry};
pub use schemas::{
    CardChange, CardSelection, DeckConstructionPlan, DeckImprovementPlan, IntentType, ModificationIntent,
    RefinementAction, RefinementActionType, RefinementPlan,
};
pub use vector_index::{IndexedCard, InProcessVectorIndex, VectorIndex, VectorSearchFilters, VectorSearchHit};

/// Parse `LLM_MODEL_ID`-style strings of the form `provider:model` (e.g.
/// `"openai:gpt-4o-mini"`). Falls back to treating the whole string as the
/// model id with an empty provider when no `:` separator is present.
pub fn parse_model_id(raw: &str) -> (&str, &str) {
    match raw.split_once(':') {
        Some((provider, model)) => (provider, model),
        None => ("", raw),
    }
}

/// Build a provider from an `LLM_MODEL_ID`-style string plus an API key,
/// choosing the concrete client by the provider prefix. Returns an error
/// for an unrecognized provider rather than silently defaulting, since a
/// typo'd `LLM_MODEL_ID` should fail loudly at startup.
pub fn provider_for_model_id(
    model_id: &str,
    api_key: &str,
) -> cardforge_core::CardforgeResult<std::sync::Arc<dyn LlmProvider>> {
    let (provider, model) = parse_model_id(model_id);
    match provider {
        "openai" => Ok(std::sync::Arc::new(OpenAiProvider::new(api_key, model))),
        "anthropic" => Ok(std::sync::Arc::new(AnthropicProvider::new(api_key, model))),
        other => Err(cardforge_core::CardforgeError::Config(cardforge_core::ConfigError::InvalidValue {
            field: "LLM_MODEL_ID".to_string(),
            value: model_id.to_string(),
            reason: format!("unrecognized provider '{other}', expected 'openai' or 'anthropic'"),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_model_id_splits_on_colon() {
        assert_eq!(parse_model_id("openai:gpt-4o-mini"), ("openai", "gpt-4o-mini"));
    }

    #[test]
    fn parse_model_id_without_colon_has_empty_provider() {
        assert_eq!(parse_model_id("gpt-4o-mini"), ("", "gpt-4o-mini"));
    }

    #[test]
    fn provider_for_model_id_rejects_unknown_provider() {
        let err = provider_for_model_id("cohere:embed-v3", "key").unwrap_err();
        assert_eq!(err.kind(), cardforge_core::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn registry_round_robins_across_two_mock_providers() {
        use cardforge_core::RoutingStrategy;
        use serde_json::json;

        let registry = ProviderRegistry::new(RoutingStrategy::RoundRobin);
        registry
            .register(std::sync::Arc::new(MockLlmProvider::single(json!({"ok": 1}))))
            .await;

        let request = CompletionRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            schema_name: "test".to_string(),
        };
        let result = registry.complete(request).await.unwrap();
        assert_eq!(result, json!({"ok": 1}));
        assert_eq!(registry.costs().completion_calls(), 1);
    }
}
