//! In-process test double for [`LlmProvider`], used by engine-layer tests
//! that need deterministic structured-output responses without a network
//! call.

use async_trait::async_trait;
use cardforge_core::{CardforgeResult, EmbeddingVector};
use serde_json::Value;
use std::sync::Mutex;

use crate::provider::{CompletionRequest, LlmProvider};

/// Returns a fixed response (or a queue of responses, consumed in order) for
/// every `complete` call, and a fixed-dimension deterministic embedding for
/// every `embed` call.
pub struct MockLlmProvider {
    responses: Mutex<Vec<Value>>,
    embedding_dimensions: usize,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses),
            embedding_dimensions: 8,
        }
    }

    pub fn single(response: Value) -> Self {
        Self::new(vec![response])
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn provider_id(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    fn supports_embedding(&self) -> bool {
        true
    }

    async fn complete(&self, _request: CompletionRequest) -> CardforgeResult<Value> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(Value::Null);
        }
        Ok(responses.remove(0))
    }

    async fn embed(&self, text: &str) -> CardforgeResult<EmbeddingVector> {
        // Deterministic pseudo-embedding derived from byte values, so the
        // same text always yields the same vector without any real model.
        let mut data = vec![0.0f32; self.embedding_dimensions];
        for (i, byte) in text.bytes().enumerate() {
            data[i % self.embedding_dimensions] += byte as f32;
        }
        Ok(EmbeddingVector::new(data, self.model_id().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn complete_returns_queued_responses_in_order() {
        let provider = MockLlmProvider::new(vec![json!({"a": 1}), json!({"a": 2})]);
        let req = CompletionRequest {
            system_prompt: String::new(),
            user_prompt: String::new(),
            schema_name: "test".to_string(),
        };
        assert_eq!(provider.complete(req.clone()).await.unwrap(), json!({"a": 1}));
        assert_eq!(provider.complete(req).await.unwrap(), json!({"a": 2}));
    }

    #[tokio::test]
    async fn embed_is_deterministic() {
        let provider = MockLlmProvider::new(vec![]);
        let a = provider.embed("Lightning Bolt").await.unwrap();
        let b = provider.embed("Lightning Bolt").await.unwrap();
        assert_eq!(a.data, b.data);
    }
}
