//! The provider-facing LLM call contract.
//!
//! Every concrete provider (OpenAI, Anthropic, ...) implements a single
//! trait covering both structured-output completions and embeddings. Most
//! providers only support one of the two; the default method returns
//! [`LlmError::ProviderNotConfigured`] for the capability they lack rather
//! than panicking.

use async_trait::async_trait;
use cardforge_core::{CardforgeError, CardforgeResult, EmbeddingVector, LlmError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A single structured-output request: a system prompt describing the task
/// and schema, and a user prompt carrying the actual content (deck list,
/// quality issues, user's free-text request, ...).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Name of the JSON schema the caller expects back, carried through for
    /// logging and for providers that support server-side schema
    /// enforcement (e.g. OpenAI's `response_format`).
    pub schema_name: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable identifier used for circuit breaker bookkeeping and routing
    /// (e.g. `"openai"`, `"anthropic"`).
    fn provider_id(&self) -> &str;

    /// Model identifier in use (e.g. `"gpt-4o-mini"`).
    fn model_id(&self) -> &str;

    /// True if this provider can serve `complete`.
    fn supports_completion(&self) -> bool {
        true
    }

    /// True if this provider can serve `embed`.
    fn supports_embedding(&self) -> bool {
        false
    }

    /// Request a structured-output completion. Returns the raw JSON value;
    /// callers are responsible for deserializing into their schema type.
    async fn complete(&self, request: CompletionRequest) -> CardforgeResult<Value>;

    /// Request an embedding vector for `text`.
    async fn embed(&self, _text: &str) -> CardforgeResult<EmbeddingVector> {
        Err(CardforgeError::Llm(LlmError::ProviderNotConfigured {
            capability: "embedding".to_string(),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub operation: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub operation: String,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub operation: String,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_request(&self, event: RequestEvent);
    async fn on_response(&self, event: ResponseEvent);
    async fn on_error(&self, event: ErrorEvent);
}

/// Chain of event listeners, invoked best-effort (a listener's own failure
/// never propagates back to the caller).
#[derive(Default)]
pub struct ListenerChain {
    listeners: Vec<std::sync::Arc<dyn EventListener>>,
}

impl ListenerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: std::sync::Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub async fn emit_request(&self, event: RequestEvent) {
        for listener in &self.listeners {
            listener.on_request(event.clone()).await;
        }
    }

    pub async fn emit_response(&self, event: ResponseEvent) {
        for listener in &self.listeners {
            listener.on_response(event.clone()).await;
        }
    }

    pub async fn emit_error(&self, event: ErrorEvent) {
        for listener in &self.listeners {
            listener.on_error(event.clone()).await;
        }
    }
}
