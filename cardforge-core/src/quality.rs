//! Deck quality scoring output.

use serde::{Deserialize, Serialize};

/// A single proposed card addition or removal within an [`ImprovementPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlanEntry {
    pub card_name: String,
    pub quantity: u32,
    pub reason: String,
}

/// LLM-generated improvement plan: additions, removals, and free-text
/// analysis. Narrative only — it never changes the numeric sub-scores it
/// accompanies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ImprovementPlan {
    pub additions: Vec<PlanEntry>,
    pub removals: Vec<PlanEntry>,
    pub analysis: String,
}

/// The four numeric sub-scores and the improvement surface the analyzer
/// produces for a deck. `overall` is always the arithmetic mean of the four
/// sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QualityMetrics {
    pub mana_curve: f32,
    pub land_ratio: f32,
    pub synergy: f32,
    pub consistency: f32,
    pub overall: f32,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    /// Absent when the LLM call failed or was never attempted; the numeric
    /// scores stand alone in that case.
    pub improvement_plan: Option<ImprovementPlan>,
}

impl QualityMetrics {
    /// Default threshold below which the analyzer emits an issue or
    /// suggestion string for a given sub-score.
    pub const WARNING_THRESHOLD: f32 = 0.6;

    /// Build metrics from the four sub-scores, computing `overall` as their
    /// arithmetic mean and clamping every value into `[0, 1]`.
    pub fn from_sub_scores(mana_curve: f32, land_ratio: f32, synergy: f32, consistency: f32) -> Self {
        let clamp = |v: f32| v.clamp(0.0, 1.0);
        let (mana_curve, land_ratio, synergy, consistency) = (
            clamp(mana_curve),
            clamp(land_ratio),
            clamp(synergy),
            clamp(consistency),
        );
        let overall = (mana_curve + land_ratio + synergy + consistency) / 4.0;
        Self {
            mana_curve,
            land_ratio,
            synergy,
            consistency,
            overall,
            issues: Vec::new(),
            suggestions: Vec::new(),
            improvement_plan: None,
        }
    }

    /// True once `overall` meets or exceeds the given quality threshold.
    pub fn meets_threshold(&self, threshold: f32) -> bool {
        self.overall >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_arithmetic_mean() {
        let m = QualityMetrics::from_sub_scores(1.0, 0.5, 0.5, 0.0);
        assert_eq!(m.overall, 0.5);
    }

    #[test]
    fn sub_scores_are_clamped() {
        let m = QualityMetrics::from_sub_scores(1.5, -0.5, 0.5, 0.5);
        assert_eq!(m.mana_curve, 1.0);
        assert_eq!(m.land_ratio, 0.0);
    }

    #[test]
    fn meets_threshold_boundary() {
        let m = QualityMetrics::from_sub_scores(0.7, 0.7, 0.7, 0.7);
        assert!(m.meets_threshold(0.7));
        assert!(!m.meets_threshold(0.71));
    }
}
