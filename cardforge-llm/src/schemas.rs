//! Structured-output contracts for the four LLM calls the engine makes.
//!
//! Each type derives `Deserialize` so a provider's JSON response parses
//! straight into it; a parse failure is the caller's cue to retry once and
//! then fall back to a degraded plan.

use cardforge_core::ImprovementPlan;
use serde::{Deserialize, Serialize};

/// One card the builder wants in the deck, with the LLM's stated reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSelection {
    pub card_name: String,
    pub quantity: u32,
    pub reasoning: String,
}

/// The agent builder's structured response to a single "build this deck"
/// call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConstructionPlan {
    pub strategy: String,
    pub card_selections: Vec<CardSelection>,
}

/// One refinement action: add, remove, or replace a named card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementAction {
    pub action_type: RefinementActionType,
    pub card_name: String,
    pub quantity: u32,
    pub reasoning: String,
    /// Populated only for `Replace`: the card taking `card_name`'s place.
    #[serde(default)]
    pub replacement_card_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementActionType {
    Add,
    Remove,
    Replace,
}

/// The builder's response to a "refine this deck given its quality issues"
/// call. Actions are applied in a fixed order: removes, then replacements,
/// then additions, then the deck is rebalanced to size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementPlan {
    pub analysis: String,
    pub actions: Vec<RefinementAction>,
}

/// The analyzer's LLM-assisted improvement plan. Reuses
/// [`cardforge_core::ImprovementPlan`] directly — it is already the
/// structured-output shape the analyzer needs, narrative additions/removals
/// plus free-text analysis, and never overrides the numeric sub-scores it
/// accompanies.
pub type DeckImprovementPlan = ImprovementPlan;

/// One concrete change the user's free-text modification request implies.
///
/// A REMOVE change is either name-driven (`card_name` set, `min_cmc`/`max_cmc`
/// both `None`) or predicate-driven ("remove all cards with CMC >= 6":
/// `card_name` empty, `min_cmc = Some(6.0)`). The two are mutually exclusive;
/// a predicate change matches every non-land card in the CMC range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardChange {
    #[serde(default)]
    pub card_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub replacement_card_name: Option<String>,
    #[serde(default)]
    pub min_cmc: Option<f32>,
    #[serde(default)]
    pub max_cmc: Option<f32>,
}

impl CardChange {
    pub fn is_cmc_predicate(&self) -> bool {
        self.min_cmc.is_some() || self.max_cmc.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentType {
    Add,
    Remove,
    Replace,
    Optimize,
    StrategyShift,
}

/// The modification executor's classification of a free-text user request.
/// `confidence` is persisted alongside the deck but MUST NOT gate which
/// execution branch runs — low confidence is surfaced as a warning, not a
/// reason to refuse the edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationIntent {
    pub intent_type: IntentType,
    pub description: String,
    pub card_changes: Vec<CardChange>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_construction_plan_roundtrips_through_json() {
        let plan = DeckConstructionPlan {
            strategy: "Aggressive red burn".to_string(),
            card_selections: vec![CardSelection {
                card_name: "Lightning Bolt".to_string(),
                quantity: 4,
                reasoning: "Efficient removal and reach".to_string(),
            }],
        };
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: DeckConstructionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, plan);
    }

    #[test]
    fn modification_intent_parses_screaming_snake_case() {
        let json = r#"{"intent_type":"STRATEGY_SHIFT","description":"go wider","card_changes":[],"confidence":0.4}"#;
        let intent: ModificationIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.intent_type, IntentType::StrategyShift);
        assert!(intent.constraints.is_empty());
    }

    #[test]
    fn card_change_defaults_card_name_and_cmc_bounds_when_absent() {
        let json = r#"{"quantity":0}"#;
        let change: CardChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.card_name, "");
        assert!(!change.is_cmc_predicate());
    }

    #[test]
    fn card_change_parses_cmc_predicate() {
        let json = r#"{"card_name":"","quantity":0,"min_cmc":6.0}"#;
        let change: CardChange = serde_json::from_str(json).unwrap();
        assert!(change.is_cmc_predicate());
        assert_eq!(change.min_cmc, Some(6.0));
        assert_eq!(change.max_cmc, None);
    }

    #[test]
    fn refinement_action_replace_carries_replacement_name() {
        let json = r#"{"action_type":"replace","card_name":"Shock","quantity":4,"reasoning":"upgrade","replacement_card_name":"Lightning Bolt"}"#;
        let action: RefinementAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.action_type, RefinementActionType::Replace);
        assert_eq!(action.replacement_card_name.as_deref(), Some("Lightning Bolt"));
    }
}
