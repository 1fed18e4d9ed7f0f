//! Orchestrator iteration bookkeeping.

use crate::{Deck, QualityMetrics, Timestamp};
use serde::{Deserialize, Serialize};

/// One append-only history entry, recorded by the orchestrator at every
/// state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IterationEntry {
    pub iteration_index: u32,
    pub deck_snapshot: Deck,
    pub quality_metrics: QualityMetrics,
    pub applied_changes: Vec<String>,
    pub timestamp: Timestamp,
}

/// Tracks the refinement loop's progress against its bounds: current
/// iteration count, the configured ceiling, the quality threshold that ends
/// the loop early, and the full append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IterationState {
    pub iteration_count: u32,
    pub max_iterations: u32,
    pub quality_threshold: f32,
    pub history: Vec<IterationEntry>,
}

impl IterationState {
    pub fn new(max_iterations: u32, quality_threshold: f32) -> Self {
        Self {
            iteration_count: 0,
            max_iterations,
            quality_threshold,
            history: Vec::new(),
        }
    }

    /// Record a completed iteration. Does not itself bump `iteration_count`
    /// — the orchestrator bumps the counter only on a `VerifyQuality →
    /// RefineDeck` transition, per the FSM's transition rules.
    pub fn record(&mut self, deck: &Deck, metrics: &QualityMetrics, applied_changes: Vec<String>) {
        self.history.push(IterationEntry {
            iteration_index: self.iteration_count,
            deck_snapshot: deck.clone(),
            quality_metrics: metrics.clone(),
            applied_changes,
            timestamp: crate::now(),
        });
    }

    /// True once either the quality threshold is met or the iteration
    /// ceiling has been reached.
    pub fn should_terminate(&self, metrics: &QualityMetrics) -> bool {
        metrics.meets_threshold(self.quality_threshold) || self.iteration_count >= self.max_iterations
    }

    pub fn bump(&mut self) {
        self.iteration_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Archetype, Format};

    #[test]
    fn terminates_on_threshold() {
        let state = IterationState::new(5, 0.7);
        let metrics = QualityMetrics::from_sub_scores(0.8, 0.8, 0.8, 0.8);
        assert!(state.should_terminate(&metrics));
    }

    #[test]
    fn terminates_on_iteration_ceiling() {
        let mut state = IterationState::new(0, 0.7);
        let low = QualityMetrics::from_sub_scores(0.1, 0.1, 0.1, 0.1);
        // max_iterations = 0: should terminate immediately regardless of score
        assert!(state.should_terminate(&low));
        state.bump();
        assert_eq!(state.iteration_count, 1);
    }

    #[test]
    fn record_appends_history_without_bumping_counter() {
        let mut state = IterationState::new(5, 0.7);
        let deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        let metrics = QualityMetrics::from_sub_scores(0.5, 0.5, 0.5, 0.5);
        state.record(&deck, &metrics, vec!["added 4 Mountain".to_string()]);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.iteration_count, 0);
    }
}
