//! OpenAI provider: chat completions in JSON mode for structured output,
//! plus the embeddings endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cardforge_core::{CardforgeError, CardforgeResult, EmbeddingVector, LlmError};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::provider::{CompletionRequest, LlmProvider};

/// Rate-limited HTTP client for the OpenAI REST API. Rate limiting is a
/// semaphore of `requests_per_minute` permits plus a minimum spacing
/// between consecutive requests, not a token-bucket — adequate for a
/// single-process deployment.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    last_request_ms: Arc<AtomicU64>,
    min_request_interval_ms: u64,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        let permits = (requests_per_minute as usize).max(1);
        let min_interval_ms = (60_000 / requests_per_minute.max(1) as u64).max(10);
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request_ms: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
        }
    }

    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Req,
    ) -> CardforgeResult<Res> {
        let _permit = self.rate_limiter.acquire().await.map_err(|e| {
            CardforgeError::Llm(LlmError::RequestFailed {
                provider: "openai".to_string(),
                status: 0,
                message: format!("rate limiter closed: {e}"),
            })
        })?;

        let now_ms = Instant::now().elapsed().as_millis() as u64;
        let last_ms = self.last_request_ms.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);
        if elapsed < self.min_request_interval_ms {
            tokio::time::sleep(Duration::from_millis(self.min_request_interval_ms - elapsed)).await;
        }
        self.last_request_ms.store(now_ms, Ordering::Relaxed);

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CardforgeError::Llm(LlmError::RequestFailed {
                    provider: "openai".to_string(),
                    status: 0,
                    message: format!("request failed: {e}"),
                })
            })?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| {
                CardforgeError::Llm(LlmError::InvalidResponse {
                    provider: "openai".to_string(),
                    reason: format!("failed to parse response: {e}"),
                })
            })
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => CardforgeError::Llm(LlmError::RateLimited {
                    provider: "openai".to_string(),
                    retry_after_ms: 1000,
                }),
                StatusCode::UNAUTHORIZED => CardforgeError::Llm(LlmError::RequestFailed {
                    provider: "openai".to_string(),
                    status: status.as_u16() as i32,
                    message: "invalid API key".to_string(),
                }),
                _ => CardforgeError::Llm(LlmError::RequestFailed {
                    provider: "openai".to_string(),
                    status: status.as_u16() as i32,
                    message: text,
                }),
            })
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Serialize)]
struct EmbeddingRequestBody {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponseBody {
    data: Vec<EmbeddingData>,
}

pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    embedding_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(api_key, 60),
            model: model.into(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn supports_embedding(&self) -> bool {
        true
    }

    async fn complete(&self, request: CompletionRequest) -> CardforgeResult<Value> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: request.system_prompt },
                ChatMessage { role: "user", content: request.user_prompt },
            ],
            response_format: ResponseFormat { r#type: "json_object" },
            temperature: 0.3,
        };

        let response: ChatResponse = self.client.request("chat/completions", body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CardforgeError::Llm(LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "no choices in response".to_string(),
            }))?
            .message
            .content;

        serde_json::from_str(&content).map_err(|e| {
            CardforgeError::Llm(LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: format!("response body is not valid JSON for schema {}: {e}", request.schema_name),
            })
        })
    }

    async fn embed(&self, text: &str) -> CardforgeResult<EmbeddingVector> {
        let body = EmbeddingRequestBody {
            model: self.embedding_model.clone(),
            input: text.to_string(),
        };
        let response: EmbeddingResponseBody = self.client.request("embeddings", body).await?;
        let data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| CardforgeError::Llm(LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "no embedding data in response".to_string(),
            }))?;
        Ok(EmbeddingVector::new(data.embedding, self.embedding_model.clone()))
    }
}
