//! LLM-related primitive types.
//!
//! Pure data types shared by the provider mediation layer. Runtime
//! orchestration (ProviderRegistry, CircuitBreaker, concrete provider
//! clients) lives in cardforge-llm.

use serde::{Deserialize, Serialize};

// ============================================================================
// PROVIDER CAPABILITY
// ============================================================================

/// Capabilities a provider can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ProviderCapability {
    /// Generate embeddings for similarity search.
    Embedding,
    /// Produce a structured deck construction or refinement plan.
    DeckPlanning,
    /// Produce a structured deck quality improvement plan.
    QualityImprovement,
}

impl ProviderCapability {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Embedding => "Embedding",
            Self::DeckPlanning => "DeckPlanning",
            Self::QualityImprovement => "QualityImprovement",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ProviderCapabilityParseError> {
        match s {
            "Embedding" => Ok(Self::Embedding),
            "DeckPlanning" => Ok(Self::DeckPlanning),
            "QualityImprovement" => Ok(Self::QualityImprovement),
            _ => Err(ProviderCapabilityParseError(s.to_string())),
        }
    }
}

/// Error parsing ProviderCapability from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapabilityParseError(pub String);

impl std::fmt::Display for ProviderCapabilityParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid provider capability: {}", self.0)
    }
}

impl std::error::Error for ProviderCapabilityParseError {}

// ============================================================================
// CIRCUIT STATE
// ============================================================================

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally.
    Closed = 0,
    /// Circuit is open, requests are rejected.
    Open = 1,
    /// Circuit is half-open, testing if the provider recovered.
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(v: u8) -> Self {
        match v {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

impl CircuitState {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::HalfOpen => "HalfOpen",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, CircuitStateParseError> {
        match s {
            "Closed" => Ok(Self::Closed),
            "Open" => Ok(Self::Open),
            "HalfOpen" => Ok(Self::HalfOpen),
            _ => Err(CircuitStateParseError(s.to_string())),
        }
    }
}

/// Error parsing CircuitState from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStateParseError(pub String);

impl std::fmt::Display for CircuitStateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid circuit state: {}", self.0)
    }
}

impl std::error::Error for CircuitStateParseError {}

// ============================================================================
// ROUTING STRATEGY
// ============================================================================

/// Strategy for routing requests to providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RoutingStrategy {
    /// Round-robin between providers.
    #[default]
    RoundRobin,
    /// Route to the provider with the lowest observed latency.
    LeastLatency,
    /// Random selection among available providers.
    Random,
    /// Route based on declared capability.
    Capability(ProviderCapability),
    /// Always use the first available provider.
    First,
}

impl RoutingStrategy {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "RoundRobin",
            Self::LeastLatency => "LeastLatency",
            Self::Random => "Random",
            Self::Capability(_) => "Capability",
            Self::First => "First",
        }
    }
}

// ============================================================================
// TOKENIZER TRAIT
// ============================================================================

/// Trait for counting tokens in text.
///
/// Used for token budget management in prompt assembly. Implementations can
/// provide exact counts (using an actual tokenizer) or heuristic estimates
/// based on character ratios.
pub trait Tokenizer: Send + Sync {
    /// Count tokens in the given text.
    fn count(&self, text: &str) -> i32;

    /// Get the model family this tokenizer is for (e.g., "gpt-4", "claude").
    fn model_family(&self) -> &str;
}

/// Heuristic tokenizer using character-to-token ratios.
///
/// This provides fast, approximate token counts without requiring an actual
/// tokenizer model. Good for budgeting prompt size before an LLM call.
#[derive(Debug, Clone)]
pub struct HeuristicTokenizer {
    /// Tokens per character ratio (model-specific).
    ratio: f32,
    /// Model family identifier.
    model_family: String,
}

impl HeuristicTokenizer {
    /// Create a new heuristic tokenizer for a specific model.
    ///
    /// Uses empirically-derived ratios based on model family.
    pub fn for_model(model: &str) -> Self {
        let (ratio, family) = if model.contains("gpt-4") || model.contains("gpt-3.5") {
            // GPT models: ~4 characters per token on average
            (0.25, "gpt")
        } else if model.contains("claude") {
            // Claude models: slightly higher token density
            (0.28, "claude")
        } else if model.contains("text-embedding") {
            // OpenAI embedding models
            (0.25, "openai-embedding")
        } else if model.contains("llama") || model.contains("mistral") {
            // Open source models vary more
            (0.27, "open-source")
        } else {
            // Conservative default
            (0.30, "unknown")
        };

        Self {
            ratio,
            model_family: family.to_string(),
        }
    }

    /// Create with a custom ratio.
    pub fn with_ratio(ratio: f32, model_family: impl Into<String>) -> Self {
        Self {
            ratio,
            model_family: model_family.into(),
        }
    }

    /// Get the current ratio.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }
}

impl Default for HeuristicTokenizer {
    fn default() -> Self {
        Self::for_model("gpt-4")
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn count(&self, text: &str) -> i32 {
        (text.len() as f32 * self.ratio).ceil() as i32
    }

    fn model_family(&self) -> &str {
        &self.model_family
    }
}

/// Estimate tokens using the default heuristic.
pub fn estimate_tokens(text: &str) -> i32 {
    HeuristicTokenizer::default().count(text)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_capability_roundtrip() {
        for cap in [
            ProviderCapability::Embedding,
            ProviderCapability::DeckPlanning,
            ProviderCapability::QualityImprovement,
        ] {
            let s = cap.as_db_str();
            let parsed = ProviderCapability::from_db_str(s).unwrap();
            assert_eq!(cap, parsed);
        }
    }

    #[test]
    fn test_circuit_state_from_u8() {
        assert_eq!(CircuitState::from(0), CircuitState::Closed);
        assert_eq!(CircuitState::from(1), CircuitState::Open);
        assert_eq!(CircuitState::from(255), CircuitState::HalfOpen);
    }

    #[test]
    fn test_circuit_state_roundtrip() {
        for state in [
            CircuitState::Closed,
            CircuitState::Open,
            CircuitState::HalfOpen,
        ] {
            let s = state.as_db_str();
            let parsed = CircuitState::from_db_str(s).unwrap();
            assert_eq!(state, parsed);
        }
    }

    #[test]
    fn test_routing_strategy_default() {
        assert_eq!(RoutingStrategy::default(), RoutingStrategy::RoundRobin);
    }

    #[test]
    fn test_heuristic_tokenizer_gpt4() {
        let tokenizer = HeuristicTokenizer::for_model("gpt-4");
        assert_eq!(tokenizer.model_family(), "gpt");
        assert_eq!(tokenizer.ratio(), 0.25);

        let text = "a".repeat(100);
        assert_eq!(tokenizer.count(&text), 25);
    }

    #[test]
    fn test_heuristic_tokenizer_claude() {
        let tokenizer = HeuristicTokenizer::for_model("claude-3-opus");
        assert_eq!(tokenizer.model_family(), "claude");
        assert_eq!(tokenizer.ratio(), 0.28);

        let text = "a".repeat(100);
        assert_eq!(tokenizer.count(&text), 28);
    }

    #[test]
    fn test_heuristic_tokenizer_custom() {
        let tokenizer = HeuristicTokenizer::with_ratio(0.5, "custom");
        assert_eq!(tokenizer.model_family(), "custom");

        let text = "a".repeat(100);
        assert_eq!(tokenizer.count(&text), 50);
    }

    #[test]
    fn test_estimate_tokens_legacy() {
        let text = "a".repeat(100);
        assert_eq!(estimate_tokens(&text), 25);
    }

    #[test]
    fn test_tokenizer_trait_object() {
        let tokenizer: Box<dyn Tokenizer> = Box::new(HeuristicTokenizer::default());
        assert!(!tokenizer.model_family().is_empty());
    }
}
