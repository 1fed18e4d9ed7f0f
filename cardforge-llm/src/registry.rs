//! Provider-registry mediation layer: every LLM call in Cardforge goes
//! through a [`ProviderRegistry`] rather than talking to a provider client
//! directly, so routing, circuit breaking, cost tracking, and event
//! listeners are uniform regardless of which component is calling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cardforge_core::{CardforgeError, CardforgeResult, EmbeddingVector, LlmError, RoutingStrategy};
use chrono::Utc;
use tokio::sync::RwLock as TokioRwLock;
use uuid::Uuid;

use crate::circuit::{CircuitBreaker, CircuitBreakerConfig};
use crate::provider::{CompletionRequest, ErrorEvent, EventListener, ListenerChain, LlmProvider, RequestEvent, ResponseEvent};

/// Tracks token usage across every call mediated by the registry. Ambient
/// bookkeeping only — never gates a call.
#[derive(Default)]
pub struct CostTracker {
    completion_calls: AtomicI64,
    embedding_calls: AtomicI64,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(&self) {
        self.completion_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_embedding(&self) {
        self.embedding_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completion_calls(&self) -> i64 {
        self.completion_calls.load(Ordering::Relaxed)
    }

    pub fn embedding_calls(&self) -> i64 {
        self.embedding_calls.load(Ordering::Relaxed)
    }
}

/// Routes LLM calls to a registered provider, enforcing circuit breaking
/// and emitting request/response/error events for every call.
pub struct ProviderRegistry {
    providers: TokioRwLock<HashMap<String, Arc<dyn LlmProvider>>>,
    routing_strategy: RoutingStrategy,
    round_robin_index: AtomicU64,
    listeners: TokioRwLock<ListenerChain>,
    circuit_breakers: TokioRwLock<HashMap<String, Arc<CircuitBreaker>>>,
    costs: CostTracker,
}

impl ProviderRegistry {
    pub fn new(routing_strategy: RoutingStrategy) -> Self {
        Self {
            providers: TokioRwLock::new(HashMap::new()),
            routing_strategy,
            round_robin_index: AtomicU64::new(0),
            listeners: TokioRwLock::new(ListenerChain::new()),
            circuit_breakers: TokioRwLock::new(HashMap::new()),
            costs: CostTracker::new(),
        }
    }

    pub fn with_round_robin() -> Self {
        Self::new(RoutingStrategy::RoundRobin)
    }

    pub fn costs(&self) -> &CostTracker {
        &self.costs
    }

    pub async fn register(&self, provider: Arc<dyn LlmProvider>) {
        let id = provider.provider_id().to_string();
        self.providers.write().await.insert(id.clone(), provider);
        self.circuit_breakers
            .write()
            .await
            .insert(id, Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())));
    }

    pub async fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().await.add(listener);
    }

    pub async fn has_providers(&self) -> bool {
        !self.providers.read().await.is_empty()
    }

    async fn select(&self, require_embedding: bool) -> CardforgeResult<Arc<dyn LlmProvider>> {
        let providers = self.providers.read().await;
        let breakers = self.circuit_breakers.read().await;

        let available: Vec<_> = providers
            .iter()
            .filter(|(id, p)| {
                let capability_ok = if require_embedding {
                    p.supports_embedding()
                } else {
                    p.supports_completion()
                };
                capability_ok
                    && breakers.get(*id).map(|cb| cb.is_allowed()).unwrap_or(true)
            })
            .collect();

        if available.is_empty() {
            return Err(CardforgeError::Llm(LlmError::AllProvidersUnavailable {
                capability: if require_embedding { "embedding" } else { "completion" }.to_string(),
            }));
        }

        let selected = match &self.routing_strategy {
            RoutingStrategy::First | RoutingStrategy::Capability(_) => available.first(),
            RoutingStrategy::RoundRobin => {
                let idx = self.round_robin_index.fetch_add(1, Ordering::Relaxed) as usize % available.len();
                available.get(idx)
            }
            RoutingStrategy::Random => {
                let seed = Utc::now().timestamp_subsec_nanos() as usize;
                available.get(seed % available.len())
            }
            // No latency history is tracked in-process; fall back to first available.
            RoutingStrategy::LeastLatency => available.first(),
        };

        selected
            .map(|(_, p)| Arc::clone(p))
            .ok_or_else(|| CardforgeError::Llm(LlmError::ProviderNotConfigured {
                capability: "completion".to_string(),
            }))
    }

    /// Route a structured-output completion call through the registry.
    pub async fn complete(&self, request: CompletionRequest) -> CardforgeResult<serde_json::Value> {
        let provider = self.select(false).await?;
        let provider_id = provider.provider_id().to_string();
        let request_id = Uuid::new_v4();
        let operation = format!("complete:{}", request.schema_name);

        self.listeners
            .read()
            .await
            .emit_request(RequestEvent {
                request_id,
                provider_id: provider_id.clone(),
                operation: operation.clone(),
                timestamp: Utc::now(),
            })
            .await;

        let start = Instant::now();
        let result = provider.complete(request).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        self.record_outcome(&provider_id, &result).await;
        self.costs.record_completion();

        match &result {
            Ok(_) => {
                self.listeners
                    .read()
                    .await
                    .emit_response(ResponseEvent {
                        request_id,
                        provider_id,
                        operation,
                        latency_ms,
                        timestamp: Utc::now(),
                    })
                    .await;
            }
            Err(e) => {
                self.listeners
                    .read()
                    .await
                    .emit_error(ErrorEvent {
                        request_id,
                        provider_id,
                        operation,
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    })
                    .await;
            }
        }

        result
    }

    /// Route an embedding call through the registry.
    pub async fn embed(&self, text: &str) -> CardforgeResult<EmbeddingVector> {
        let provider = self.select(true).await?;
        let provider_id = provider.provider_id().to_string();
        let result = provider.embed(text).await;
        self.record_outcome(&provider_id, &result).await;
        self.costs.record_embedding();
        result
    }

    async fn record_outcome<T>(&self, provider_id: &str, result: &CardforgeResult<T>) {
        let breakers = self.circuit_breakers.read().await;
        if let Some(cb) = breakers.get(provider_id) {
            match result {
                Ok(_) => cb.record_success(),
                Err(_) => cb.record_failure(),
            }
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("routing_strategy", &self.routing_strategy)
            .finish()
    }
}
