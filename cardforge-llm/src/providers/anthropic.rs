//! Anthropic provider: structured output via an explicit JSON-only system
//! prompt instruction (Claude's Messages API has no first-class JSON mode
//! at the time this client was written). No embeddings endpoint exists for
//! this provider; `supports_embedding` stays `false`.

use async_trait::async_trait;
use cardforge_core::{CardforgeError, CardforgeResult, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{CompletionRequest, LlmProvider};

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct MessageRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

pub struct AnthropicProvider {
    http: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 4096,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> CardforgeResult<Value> {
        let system = format!(
            "{}\n\nRespond with JSON only, matching the {} schema. No prose, no markdown fences.",
            request.system_prompt, request.schema_name
        );

        let body = MessageRequest {
            model: self.model.clone(),
            system,
            messages: vec![AnthropicMessage { role: "user", content: request.user_prompt }],
            max_tokens: self.max_tokens,
            temperature: 0.3,
        };

        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CardforgeError::Llm(LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                status: 0,
                message: format!("request failed: {e}"),
            }))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CardforgeError::Llm(LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                status: status.as_u16() as i32,
                message: text,
            }));
        }

        let parsed: MessageResponse = response.json().await.map_err(|e| {
            CardforgeError::Llm(LlmError::InvalidResponse {
                provider: "anthropic".to_string(),
                reason: format!("failed to parse response envelope: {e}"),
            })
        })?;

        let text = parsed
            .content
            .into_iter()
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        serde_json::from_str(&text).map_err(|e| {
            CardforgeError::Llm(LlmError::InvalidResponse {
                provider: "anthropic".to_string(),
                reason: format!("response body is not valid JSON for schema {}: {e}", request.schema_name),
            })
        })
    }
}
