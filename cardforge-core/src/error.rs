//! Error types for Cardforge operations.

use thiserror::Error;

/// Request-facing error classification, stable across error sources so the
/// API layer can map onto an HTTP status without matching every inner
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    UpstreamUnavailable,
    ParseFailure,
    InvariantViolation,
    Timeout,
    Internal,
}

/// Storage layer errors (catalog store, deck store, tiered cache).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Update failed for {id}: {reason}")]
    UpdateFailed { id: String, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Index error on {index_name}: {reason}")]
    IndexError { index_name: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Catalog backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// LLM provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No LLM provider configured for capability {capability}")]
    ProviderNotConfigured { capability: String },

    #[error("All providers for capability {capability} are circuit-broken")]
    AllProvidersUnavailable { capability: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Call to {provider} timed out after {elapsed_ms}ms")]
    TimedOut { provider: String, elapsed_ms: u64 },
}

/// Data-model invariant errors raised while constructing or validating a
/// deck against its format rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Deck does not satisfy format size requirements: have {actual}, need {expected}")]
    DeckSizeMismatch { expected: u32, actual: u32 },

    #[error("Card '{card_name}' exceeds the copy limit for its format ({limit})")]
    CopyLimitExceeded { card_name: String, limit: u32 },

    #[error("Singleton format requires unique card names, duplicate found: '{card_name}'")]
    SingletonViolation { card_name: String },

    #[error("Legendary rule violated for '{card_name}'")]
    LegendaryViolation { card_name: String },

    #[error("Card color identity {card_identity} is not within commander identity {commander_identity}")]
    ColorIdentityMismatch {
        card_identity: String,
        commander_identity: String,
    },

    #[error("Invalid quantity {quantity} for card '{card_name}'")]
    InvalidQuantity { card_name: String, quantity: i32 },

    #[error("Unrecognized value '{value}' for {field}")]
    InvalidEnumValue { field: String, value: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Vector operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("Model mismatch: expected {expected}, got {got}")]
    ModelMismatch { expected: String, got: String },
}

/// Engine-layer errors: analyzer, agent builder, modification executor, and
/// the FSM orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Orchestrator state transition from {from} on {event} is undefined")]
    InvalidTransition { from: String, event: String },

    #[error("Deck could not be brought to required size {required} after auto-fill/trim (stuck at {actual})")]
    SizeReconciliationFailed { required: u32, actual: u32 },

    #[error("Modification references unknown card '{0}'")]
    UnresolvedCard(String),

    #[error("Replacement for '{original}' could not be resolved, change rolled back")]
    ReplacementUnresolvable { original: String },

    #[error("Refinement plan produced no applicable changes")]
    EmptyRefinementPlan,

    #[error("Iteration ceiling {max_iterations} reached without meeting quality threshold")]
    IterationCeilingReached { max_iterations: u32 },
}

/// Master error type for all Cardforge operations.
#[derive(Debug, Clone, Error)]
pub enum CardforgeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CardforgeError {
    /// Classify this error into one of the seven request-facing kinds used
    /// by the API layer to choose an HTTP status and envelope shape.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CardforgeError::Storage(e) => match e {
                StorageError::CardNotFound(_) | StorageError::DeckNotFound(_) => {
                    ErrorKind::NotFound
                }
                StorageError::Unavailable { .. } | StorageError::LockPoisoned => {
                    ErrorKind::UpstreamUnavailable
                }
                _ => ErrorKind::Internal,
            },
            CardforgeError::Llm(e) => match e {
                LlmError::TimedOut { .. } => ErrorKind::Timeout,
                LlmError::InvalidResponse { .. } => ErrorKind::ParseFailure,
                LlmError::ProviderNotConfigured { .. }
                | LlmError::AllProvidersUnavailable { .. }
                | LlmError::RequestFailed { .. }
                | LlmError::RateLimited { .. } => ErrorKind::UpstreamUnavailable,
            },
            CardforgeError::Core(e) => match e {
                CoreError::InvalidEnumValue { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::InvariantViolation,
            },
            CardforgeError::Config(_) => ErrorKind::Internal,
            CardforgeError::Vector(_) => ErrorKind::Internal,
            CardforgeError::Engine(e) => match e {
                EngineError::UnresolvedCard(_) => ErrorKind::NotFound,
                EngineError::InvalidTransition { .. } => ErrorKind::Internal,
                _ => ErrorKind::InvariantViolation,
            },
            CardforgeError::InvalidInput(_) => ErrorKind::InvalidInput,
            CardforgeError::Timeout(_) => ErrorKind::Timeout,
            CardforgeError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias used throughout Cardforge.
pub type CardforgeResult<T> = Result<T, CardforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found_kind() {
        let err: CardforgeError = StorageError::CardNotFound("Lightning Bolt".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn timeout_maps_to_timeout_kind() {
        let err: CardforgeError = LlmError::TimedOut {
            provider: "openai".into(),
            elapsed_ms: 2000,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn invariant_violation_maps_correctly() {
        let err: CardforgeError = CoreError::SingletonViolation {
            card_name: "Sol Ring".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn invalid_response_maps_to_parse_failure() {
        let err: CardforgeError = LlmError::InvalidResponse {
            provider: "anthropic".into(),
            reason: "missing field".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }
}
