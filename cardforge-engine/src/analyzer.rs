//! Deck quality analyzer: four deterministic numeric sub-scores plus an
//! optional LLM-assisted improvement plan layered on top. The numeric
//! scores are never overridden by the LLM call — a failed or degraded call
//! only means `improvement_plan` stays `None`.

use std::sync::Arc;

use cardforge_core::{
    derive_strategic_tags, Deck, FormatRules, ImprovementPlan, QualityMetrics,
};
use cardforge_context::{ContextAssembler, PromptPackage};
use cardforge_llm::{CompletionRequest, ProviderRegistry};

/// Token budget handed to [`ContextAssembler`] when building the
/// improvement-plan prompt. Generous enough for a full decklist plus a
/// handful of oracle-text excerpts without needing truncation in the
/// common case.
const IMPROVEMENT_PROMPT_TOKEN_BUDGET: i32 = 6_000;

pub struct QualityAnalyzer {
    llm: Arc<ProviderRegistry>,
}

impl QualityAnalyzer {
    pub fn new(llm: Arc<ProviderRegistry>) -> Self {
        Self { llm }
    }

    /// Compute the four numeric sub-scores plus issues/suggestions, with no
    /// LLM involvement. Always succeeds.
    pub fn score(&self, deck: &Deck) -> QualityMetrics {
        let rules = FormatRules::for_format(deck.format);
        let mana_curve = self.score_mana_curve(deck);
        let land_ratio = self.score_land_ratio(deck, &rules);
        let synergy = self.score_synergy(deck);
        let consistency = self.score_consistency(deck, &rules);

        let mut metrics = QualityMetrics::from_sub_scores(mana_curve, land_ratio, synergy, consistency);
        self.annotate(deck, &rules, &mut metrics);
        metrics
    }

    /// Full analysis: numeric scoring plus a best-effort LLM improvement
    /// plan. On an LLM failure, retries once; a second failure degrades to
    /// the numeric-only result rather than propagating the error, since a
    /// quality read should never fail just because the improvement
    /// narrative couldn't be generated.
    pub async fn analyze(&self, deck: &Deck) -> QualityMetrics {
        let mut metrics = self.score(deck);
        if metrics.overall >= QualityMetrics::WARNING_THRESHOLD && metrics.issues.is_empty() {
            // Still worth an improvement plan below threshold-adjacent decks,
            // but a clean pass skips the LLM round trip entirely.
            return metrics;
        }

        for attempt in 0..2 {
            match self.request_improvement_plan(deck, &metrics).await {
                Ok(plan) => {
                    metrics.improvement_plan = Some(plan);
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "analyze: improvement plan request failed");
                }
            }
        }
        metrics
    }

    async fn request_improvement_plan(&self, deck: &Deck, metrics: &QualityMetrics) -> cardforge_core::CardforgeResult<ImprovementPlan> {
        let package = self.build_prompt_package(deck, metrics);
        let system_prompt = package.system_instructions.clone().unwrap_or_default();
        let assembler = ContextAssembler::new(IMPROVEMENT_PROMPT_TOKEN_BUDGET);
        let window = assembler.assemble(package);

        let request = CompletionRequest {
            system_prompt,
            user_prompt: window.as_text(),
            schema_name: "DeckImprovementPlan".to_string(),
        };
        let value = self.llm.complete(request).await?;
        serde_json::from_value(value).map_err(|e| {
            cardforge_core::CardforgeError::Llm(cardforge_core::LlmError::InvalidResponse {
                provider: "registry".to_string(),
                reason: format!("improvement plan did not match schema: {e}"),
            })
        })
    }

    fn build_prompt_package(&self, deck: &Deck, metrics: &QualityMetrics) -> PromptPackage {
        let card_list = deck
            .cards
            .iter()
            .map(|dc| format!("{}x {}", dc.quantity, dc.card.name))
            .collect::<Vec<_>>()
            .join("\n");

        let oracle_excerpts = deck
            .cards
            .iter()
            .filter(|dc| !dc.card.oracle_text.is_empty())
            .map(|dc| format!("{}: {}", dc.card.name, dc.card.oracle_text))
            .collect();

        let metrics_summary = format!(
            "mana_curve={:.2} land_ratio={:.2} synergy={:.2} consistency={:.2} overall={:.2}",
            metrics.mana_curve, metrics.land_ratio, metrics.synergy, metrics.consistency, metrics.overall
        );

        PromptPackage::new(card_list)
            .with_system(
                "You are a Magic: The Gathering deck-building assistant. Given a decklist, its \
                 numeric quality scores, and the issues already identified, propose concrete \
                 additions and removals that would raise the weakest scores. Respond with JSON \
                 matching the requested schema only.",
            )
            .with_user_prompt(format!("Analyze this {:?} deck and propose an improvement plan.", deck.archetype))
            .with_format_rules_summary(format!(
                "{:?}, {} cards, copy_limit={}",
                deck.format,
                FormatRules::for_format(deck.format).deck_size,
                FormatRules::for_format(deck.format).copy_limit
            ))
            .with_metrics_summary(metrics_summary)
            .with_suggestions(metrics.suggestions.clone())
            .with_oracle_excerpts(oracle_excerpts)
    }

    fn score_mana_curve(&self, deck: &Deck) -> f32 {
        let ideal = FormatRules::ideal_curve(deck.archetype);
        let non_land_total: u32 = deck.non_land_cards().map(|dc| dc.quantity).sum();
        if non_land_total == 0 {
            return 0.0;
        }

        let mut actual = [0f32; cardforge_core::CURVE_BUCKETS];
        for dc in deck.non_land_cards() {
            let bucket = cardforge_core::cmc_bucket(dc.card.cmc);
            actual[bucket] += dc.quantity as f32 / non_land_total as f32;
        }

        let l1_distance: f32 = ideal.iter().zip(actual.iter()).map(|(i, a)| (i - a).abs()).sum();
        (1.0 - l1_distance / 2.0).clamp(0.0, 1.0)
    }

    fn score_land_ratio(&self, deck: &Deck, rules: &FormatRules) -> f32 {
        let ideal = FormatRules::ideal_land_count(deck.format, deck.archetype) as f32;
        if ideal == 0.0 {
            return 1.0;
        }
        let actual = deck.land_count() as f32;
        let band = ideal * 0.2;
        let deviation = (actual - ideal).abs();
        let _ = rules;
        (1.0 - deviation / band.max(1.0)).clamp(0.0, 1.0)
    }

    /// Synergy scoring is purely heuristic, built only from deterministic
    /// strategic tags. An LLM is never consulted here: the improvement plan
    /// narrative can suggest synergy changes, but the score itself always
    /// traces to tag overlap so it stays reproducible across runs.
    fn score_synergy(&self, deck: &Deck) -> f32 {
        if deck.cards.is_empty() {
            return 0.0;
        }

        let mut tag_counts: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
        let mut anti_synergy_hits = 0u32;
        let mut total_tags = 0u32;

        for dc in &deck.cards {
            let tags = derive_strategic_tags(&dc.card.oracle_text, &dc.card.type_line, &dc.card.subtype_list);
            for tag in &tags {
                total_tags += 1;
                if tag.starts_with("anti-synergy:") {
                    anti_synergy_hits += dc.quantity;
                } else {
                    *tag_counts.entry(tag.clone()).or_insert(0) += dc.quantity;
                }
            }
        }

        if total_tags == 0 {
            return 0.5;
        }

        let clustered: u32 = tag_counts.values().filter(|&&count| count >= 3).sum();
        let total_quantity: u32 = deck.cards.iter().map(|dc| dc.quantity).sum();
        let cluster_score = if total_quantity == 0 { 0.0 } else { clustered as f32 / total_quantity as f32 };
        let anti_penalty = if total_quantity == 0 { 0.0 } else { anti_synergy_hits as f32 / total_quantity as f32 };

        (cluster_score - anti_penalty * 0.5).clamp(0.0, 1.0)
    }

    fn score_consistency(&self, deck: &Deck, rules: &FormatRules) -> f32 {
        if deck.cards.is_empty() {
            return 0.0;
        }

        let mut penalty = 0.0f32;
        let mut checked = 0u32;
        for dc in &deck.cards {
            if dc.card.is_basic_land() {
                continue;
            }
            checked += 1;
            if rules.singleton {
                if dc.quantity > 1 {
                    penalty += 1.0;
                }
            } else if dc.quantity < rules.copy_limit && !dc.card.is_land() {
                // Playset reward: non-land cards run at fewer than the copy
                // limit cost consistency, scaled by how far short they fall.
                penalty += (rules.copy_limit - dc.quantity) as f32 / rules.copy_limit as f32 * 0.25;
            }
        }

        if checked == 0 {
            return 1.0;
        }
        (1.0 - penalty / checked as f32).clamp(0.0, 1.0)
    }

    fn annotate(&self, deck: &Deck, rules: &FormatRules, metrics: &mut QualityMetrics) {
        let threshold = QualityMetrics::WARNING_THRESHOLD;
        if metrics.mana_curve < threshold {
            metrics.issues.push("Mana curve deviates significantly from the archetype's ideal distribution".to_string());
            metrics.suggestions.push("Adjust the spell curve toward the archetype's target CMC distribution".to_string());
        }
        if metrics.land_ratio < threshold {
            let ideal = FormatRules::ideal_land_count(deck.format, deck.archetype);
            let actual = deck.land_count();
            if actual < ideal {
                metrics.issues.push(format!("Too few lands: {actual} versus an ideal of {ideal}"));
                metrics.suggestions.push("Add more lands to improve mana consistency".to_string());
            } else {
                metrics.issues.push(format!("Too many lands: {actual} versus an ideal of {ideal}"));
                metrics.suggestions.push("Cut excess lands for more impactful spells".to_string());
            }
        }
        if metrics.synergy < threshold {
            metrics.issues.push("Cards show weak thematic synergy with one another".to_string());
            metrics.suggestions.push("Focus the deck around fewer, more mutually-reinforcing strategic themes".to_string());
        }
        if metrics.consistency < threshold {
            if rules.singleton {
                metrics.issues.push("Singleton violations detected".to_string());
            } else {
                metrics.issues.push("Card choices run below the format's copy limit more than the archetype can afford".to_string());
            }
            metrics.suggestions.push("Prefer full playsets of the deck's most impactful non-land cards".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{Archetype, Card, Color, Format, Rarity};
    use std::collections::HashMap;
    use std::sync::Arc as StdArc;

    fn land(name: &str) -> StdArc<Card> {
        StdArc::new(Card {
            id: cardforge_core::CardId::now_v7(),
            name: name.to_string(),
            mana_cost: String::new(),
            cmc: 0.0,
            colors: Color::empty(),
            color_identity: Color::empty(),
            type_line: "Basic Land".to_string(),
            type_list: vec!["Land".to_string()],
            subtype_list: vec![],
            oracle_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Common,
            legalities: HashMap::new(),
            keywords: vec![],
        })
    }

    fn spell(name: &str, cmc: f32, oracle: &str) -> StdArc<Card> {
        StdArc::new(Card {
            id: cardforge_core::CardId::now_v7(),
            name: name.to_string(),
            mana_cost: format!("{{{}}}", cmc as u32),
            cmc,
            colors: Color::RED,
            color_identity: Color::RED,
            type_line: "Instant".to_string(),
            type_list: vec!["Instant".to_string()],
            subtype_list: vec![],
            oracle_text: oracle.to_string(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Common,
            legalities: HashMap::new(),
            keywords: vec![],
        })
    }

    #[test]
    fn empty_deck_scores_zero_overall() {
        let deck = Deck::new("Empty", Format::Standard, Archetype::Aggro);
        let analyzer = QualityAnalyzer::new(Arc::new(ProviderRegistry::with_round_robin()));
        let metrics = analyzer.score(&deck);
        assert_eq!(metrics.overall, 0.0);
    }

    #[test]
    fn deck_with_no_lands_scores_low_land_ratio() {
        let mut deck = Deck::new("No Lands", Format::Standard, Archetype::Aggro);
        for i in 0..20 {
            deck.cards.push(cardforge_core::DeckCard::new(spell(&format!("Bolt {i}"), 1.0, "Deal 3 damage."), 1));
        }
        let analyzer = QualityAnalyzer::new(Arc::new(ProviderRegistry::with_round_robin()));
        let metrics = analyzer.score(&deck);
        assert!(metrics.land_ratio < 0.5, "land_ratio was {}", metrics.land_ratio);
    }

    #[test]
    fn well_proportioned_lands_score_near_one() {
        let mut deck = Deck::new("Balanced", Format::Standard, Archetype::Aggro);
        deck.cards.push(cardforge_core::DeckCard::new(land("Mountain"), 15));
        for i in 0..20 {
            deck.cards.push(cardforge_core::DeckCard::new(spell(&format!("Bolt {i}"), 2.0, "Deal 3 damage."), 1));
        }
        let analyzer = QualityAnalyzer::new(Arc::new(ProviderRegistry::with_round_robin()));
        let metrics = analyzer.score(&deck);
        assert!(metrics.land_ratio > 0.9, "land_ratio was {}", metrics.land_ratio);
    }

    #[test]
    fn issues_populate_below_warning_threshold() {
        let deck = Deck::new("Empty", Format::Standard, Archetype::Aggro);
        let analyzer = QualityAnalyzer::new(Arc::new(ProviderRegistry::with_round_robin()));
        let metrics = analyzer.score(&deck);
        assert!(!metrics.issues.is_empty());
    }
}
