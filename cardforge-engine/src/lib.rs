//! Cardforge Engine - Deck Construction Orchestration
//!
//! Ties together the card repository, quality analyzer, agent builder,
//! modification executor, and the FSM orchestrator that drives a deck
//! through its construction and refinement lifecycle.

pub mod analyzer;
pub mod builder;
pub mod executor;
pub mod orchestrator;
pub mod repository;

pub use analyzer::QualityAnalyzer;
pub use builder::AgentBuilder;
pub use executor::{ExecutionOutcome, ModificationExecutor};
pub use orchestrator::{
    BuildOutcome, BuildState, ModificationState, ModifyOutcome, Orchestrator, OrchestrationRequest,
    OrchestratorOutcome, DEFAULT_MAX_ITERATIONS, DEFAULT_QUALITY_THRESHOLD,
};
pub use repository::CardRepository;
