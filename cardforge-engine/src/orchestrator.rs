//! FSM orchestrator: drives a deck through its construction/refinement
//! lifecycle, recording an [`IterationState`] entry at every transition.
//! States are a plain enum, not a type-parameterized typestate, since the
//! orchestrator holds the current state as runtime data that gets recorded
//! into history rather than enforced at the type level.

use std::sync::Arc;

use cardforge_core::{Archetype, CardforgeResult, Color, Deck, Format, IterationState, QualityMetrics};
use cardforge_llm::ProviderRegistry;

use crate::analyzer::QualityAnalyzer;
use crate::builder::AgentBuilder;
use crate::executor::{ExecutionOutcome, ModificationExecutor};
use crate::repository::CardRepository;

pub const DEFAULT_QUALITY_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Lifecycle state for the new-deck construction flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    ParseRequest,
    BuildInitial,
    VerifyQuality,
    RefineDeck,
    Terminal,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Terminal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildState::ParseRequest => "parse_request",
            BuildState::BuildInitial => "build_initial",
            BuildState::VerifyQuality => "verify_quality",
            BuildState::RefineDeck => "refine_deck",
            BuildState::Terminal => "terminal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "parse_request" => Some(BuildState::ParseRequest),
            "build_initial" => Some(BuildState::BuildInitial),
            "verify_quality" => Some(BuildState::VerifyQuality),
            "refine_deck" => Some(BuildState::RefineDeck),
            "terminal" => Some(BuildState::Terminal),
            _ => None,
        }
    }
}

/// Lifecycle state for the modification flow against an existing deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationState {
    Route,
    UserModification,
    Terminal,
}

impl ModificationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ModificationState::Terminal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModificationState::Route => "route",
            ModificationState::UserModification => "user_modification",
            ModificationState::Terminal => "terminal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "route" => Some(ModificationState::Route),
            "user_modification" => Some(ModificationState::UserModification),
            "terminal" => Some(ModificationState::Terminal),
            _ => None,
        }
    }
}

/// A new-deck request carries the construction parameters directly; a
/// modification request carries an existing deck plus a free-text prompt.
/// Routing between the two orchestration flows is deterministic on which
/// variant arrives, never guessed from prompt content.
pub enum OrchestrationRequest {
    NewDeck { name: String, format: Format, archetype: Archetype, colors: Color },
    Modify { deck: Deck, user_prompt: String, run_quality_check: bool },
}

pub struct BuildOutcome {
    pub deck: Deck,
    pub quality: QualityMetrics,
    pub iteration_state: IterationState,
}

pub struct ModifyOutcome {
    pub deck: Deck,
    pub execution: ExecutionOutcome,
}

/// Drives both orchestration flows. Holds no per-request mutable state
/// itself; each call builds and returns its own [`IterationState`] history.
pub struct Orchestrator {
    builder: AgentBuilder,
    analyzer: QualityAnalyzer,
    executor: ModificationExecutor,
    quality_threshold: f32,
    max_iterations: u32,
}

impl Orchestrator {
    pub fn new(repository: Arc<CardRepository>, llm: Arc<ProviderRegistry>) -> Self {
        Self {
            builder: AgentBuilder::new(repository.clone(), llm.clone()),
            analyzer: QualityAnalyzer::new(llm.clone()),
            executor: ModificationExecutor::new(repository, llm),
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_bounds(mut self, quality_threshold: f32, max_iterations: u32) -> Self {
        self.quality_threshold = quality_threshold;
        self.max_iterations = max_iterations;
        self
    }

    pub async fn run(&self, request: OrchestrationRequest) -> CardforgeResult<OrchestratorOutcome> {
        match request {
            OrchestrationRequest::NewDeck { name, format, archetype, colors } => {
                self.run_build(&name, format, archetype, colors).await.map(OrchestratorOutcome::Build)
            }
            OrchestrationRequest::Modify { mut deck, user_prompt, run_quality_check } => {
                self.run_modify(&mut deck, &user_prompt, run_quality_check).await.map(|execution| {
                    OrchestratorOutcome::Modify(ModifyOutcome { deck, execution })
                })
            }
        }
    }

    #[tracing::instrument(skip(self), fields(format = ?format, archetype = ?archetype))]
    async fn run_build(&self, name: &str, format: Format, archetype: Archetype, colors: Color) -> CardforgeResult<BuildOutcome> {
        let mut state = BuildState::ParseRequest;
        let mut iteration_state = IterationState::new(self.max_iterations, self.quality_threshold);
        tracing::info!(state = state.as_str(), "transition");

        state = BuildState::BuildInitial;
        tracing::info!(state = state.as_str(), "transition");
        let mut deck = self.builder.build_initial(name, format, archetype, colors).await?;

        loop {
            state = BuildState::VerifyQuality;
            tracing::info!(state = state.as_str(), iteration = iteration_state.iteration_count, "transition");
            let metrics = self.analyzer.analyze(&deck).await;
            iteration_state.record(&deck, &metrics, vec!["built/refined deck".to_string()]);

            if iteration_state.should_terminate(&metrics) {
                state = BuildState::Terminal;
                tracing::info!(state = state.as_str(), overall = metrics.overall, "transition");
                return Ok(BuildOutcome { deck, quality: metrics, iteration_state });
            }

            state = BuildState::RefineDeck;
            iteration_state.bump();
            tracing::info!(state = state.as_str(), iteration = iteration_state.iteration_count, "transition");
            self.builder.refine(&mut deck, &metrics).await?;
        }
    }

    #[tracing::instrument(skip(self, deck, user_prompt))]
    async fn run_modify(&self, deck: &mut Deck, user_prompt: &str, run_quality_check: bool) -> CardforgeResult<ExecutionOutcome> {
        let mut state = ModificationState::Route;
        tracing::info!(state = state.as_str(), "transition");

        state = ModificationState::UserModification;
        tracing::info!(state = state.as_str(), "transition");
        let outcome = self.executor.execute(deck, user_prompt, run_quality_check).await?;

        state = ModificationState::Terminal;
        tracing::info!(state = state.as_str(), "transition");
        Ok(outcome)
    }
}

pub enum OrchestratorOutcome {
    Build(BuildOutcome),
    Modify(ModifyOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_state_round_trips_through_str() {
        for state in [
            BuildState::ParseRequest,
            BuildState::BuildInitial,
            BuildState::VerifyQuality,
            BuildState::RefineDeck,
            BuildState::Terminal,
        ] {
            assert_eq!(BuildState::from_str(state.as_str()), Some(state));
        }
    }

    #[test]
    fn only_terminal_state_is_terminal() {
        assert!(!BuildState::ParseRequest.is_terminal());
        assert!(BuildState::Terminal.is_terminal());
        assert!(!ModificationState::Route.is_terminal());
        assert!(ModificationState::Terminal.is_terminal());
    }

    #[test]
    fn modification_state_round_trips_through_str() {
        for state in [ModificationState::Route, ModificationState::UserModification, ModificationState::Terminal] {
            assert_eq!(ModificationState::from_str(state.as_str()), Some(state));
        }
    }
}
