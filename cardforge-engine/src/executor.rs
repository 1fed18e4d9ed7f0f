//! Modification executor: classifies a free-text user request into a
//! [`ModificationIntent`] via a structured-output call, then dispatches to
//! one of five execution branches. `confidence` is persisted but never
//! gates which branch runs — low confidence is a caller-facing warning,
//! not a refusal.

use std::sync::Arc;

use cardforge_core::{CardforgeResult, Deck, DeckCard, EngineError, FormatRules};
use cardforge_llm::{CompletionRequest, IntentType, ModificationIntent, ProviderRegistry};

use crate::analyzer::QualityAnalyzer;
use crate::repository::CardRepository;

/// Result of executing one modification request.
pub struct ExecutionOutcome {
    pub intent: ModificationIntent,
    pub quality: Option<cardforge_core::QualityMetrics>,
}

pub struct ModificationExecutor {
    repository: Arc<CardRepository>,
    llm: Arc<ProviderRegistry>,
    analyzer: QualityAnalyzer,
}

impl ModificationExecutor {
    pub fn new(repository: Arc<CardRepository>, llm: Arc<ProviderRegistry>) -> Self {
        let analyzer = QualityAnalyzer::new(llm.clone());
        Self { repository, llm, analyzer }
    }

    /// Classify and apply one free-text modification request against
    /// `deck`. When `run_quality_check` is set, the returned outcome
    /// includes a post-modification quality read.
    pub async fn execute(&self, deck: &mut Deck, request_text: &str, run_quality_check: bool) -> CardforgeResult<ExecutionOutcome> {
        let intent = self.classify(deck, request_text).await?;
        if intent.confidence < 0.3 {
            tracing::warn!(confidence = intent.confidence, description = %intent.description, "low-confidence modification intent, proceeding anyway");
        }

        let rules = FormatRules::for_format(deck.format);
        match intent.intent_type {
            IntentType::Add => self.execute_add(deck, &intent, &rules).await?,
            IntentType::Remove => self.execute_remove(deck, &intent),
            IntentType::Replace => self.execute_replace(deck, &intent, &rules).await?,
            IntentType::Optimize => self.execute_optimize(deck, &rules).await?,
            IntentType::StrategyShift => self.execute_strategy_shift(deck, &intent, &rules).await?,
        }

        self.reconcile_size(deck, &rules).await?;

        let quality = if run_quality_check { Some(self.analyzer.analyze(deck).await) } else { None };
        Ok(ExecutionOutcome { intent, quality })
    }

    async fn classify(&self, deck: &Deck, request_text: &str) -> CardforgeResult<ModificationIntent> {
        let card_list = deck
            .cards
            .iter()
            .map(|dc| format!("{}x {} (CMC {})", dc.quantity, dc.card.name, dc.card.cmc))
            .collect::<Vec<_>>()
            .join("\n");

        let request = CompletionRequest {
            system_prompt:
                "Classify the user's deck modification request into one of ADD, REMOVE, REPLACE, \
                 OPTIMIZE, or STRATEGY_SHIFT, and list the concrete card changes implied. For a \
                 REMOVE that names a CMC threshold instead of (or in addition to) specific cards \
                 (e.g. \"remove all cards with CMC >= 6\"), leave card_name empty and set min_cmc \
                 and/or max_cmc instead. Respond with JSON matching the requested schema only."
                    .to_string(),
            user_prompt: format!(
                "Deck archetype: {:?}, format: {:?}. Current decklist:\n{card_list}\n\nRequest: {request_text}",
                deck.archetype, deck.format
            ),
            schema_name: "ModificationIntent".to_string(),
        };
        let value = self.llm.complete(request).await?;
        serde_json::from_value(value).map_err(|e| {
            cardforge_core::CardforgeError::Llm(cardforge_core::LlmError::InvalidResponse {
                provider: "registry".to_string(),
                reason: format!("modification intent did not match schema: {e}"),
            })
        })
    }

    async fn execute_add(&self, deck: &mut Deck, intent: &ModificationIntent, rules: &FormatRules) -> CardforgeResult<()> {
        for change in &intent.card_changes {
            self.add_card(deck, &change.card_name, change.quantity.max(1), rules).await?;
        }
        Ok(())
    }

    /// Name-driven changes decrement one matching entry; CMC-predicate
    /// changes drop every non-land card whose CMC falls in
    /// `[min_cmc, max_cmc]` (open-ended on whichever bound is unset)
    /// entirely, since "remove all cards with CMC >= 6" has no partial
    /// per-card quantity to preserve.
    fn execute_remove(&self, deck: &mut Deck, intent: &ModificationIntent) {
        for change in &intent.card_changes {
            if change.is_cmc_predicate() {
                let min_cmc = change.min_cmc.unwrap_or(f32::MIN);
                let max_cmc = change.max_cmc.unwrap_or(f32::MAX);
                deck.cards.retain(|dc| dc.card.is_land() || dc.card.cmc < min_cmc || dc.card.cmc > max_cmc);
                continue;
            }
            if let Some(pos) = deck.cards.iter().position(|dc| dc.card.name.eq_ignore_ascii_case(&change.card_name)) {
                let remaining = deck.cards[pos].quantity.saturating_sub(change.quantity.max(1));
                if remaining == 0 {
                    deck.cards.remove(pos);
                } else {
                    deck.cards[pos].quantity = remaining;
                }
            }
        }
    }

    async fn execute_replace(&self, deck: &mut Deck, intent: &ModificationIntent, rules: &FormatRules) -> CardforgeResult<()> {
        for change in &intent.card_changes {
            let Some(replacement) = &change.replacement_card_name else {
                return Err(EngineError::ReplacementUnresolvable { original: change.card_name.clone() }.into());
            };
            let snapshot = deck.cards.clone();
            let quantity = deck.quantity_of(&change.card_name).max(change.quantity.max(1));
            deck.cards.retain(|dc| !dc.card.name.eq_ignore_ascii_case(&change.card_name));

            if let Err(e) = self.add_card(deck, replacement, quantity, rules).await {
                deck.cards = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    /// No card changes to apply directly: hands the deck to the analyzer's
    /// improvement-plan path and applies its additions/removals the same
    /// way the refinement flow does.
    async fn execute_optimize(&self, deck: &mut Deck, rules: &FormatRules) -> CardforgeResult<()> {
        let metrics = self.analyzer.analyze(deck).await;
        let Some(plan) = metrics.improvement_plan else {
            return Err(EngineError::EmptyRefinementPlan.into());
        };

        for removal in &plan.removals {
            if let Some(pos) = deck.cards.iter().position(|dc| dc.card.name.eq_ignore_ascii_case(&removal.card_name)) {
                let remaining = deck.cards[pos].quantity.saturating_sub(removal.quantity.max(1));
                if remaining == 0 {
                    deck.cards.remove(pos);
                } else {
                    deck.cards[pos].quantity = remaining;
                }
            }
        }
        for addition in &plan.additions {
            self.add_card(deck, &addition.card_name, addition.quantity.max(1), rules).await?;
        }
        Ok(())
    }

    /// A broader rework than `Optimize`: clears non-land cards and rebuilds
    /// from the intent's card changes, preserving the existing manabase.
    async fn execute_strategy_shift(&self, deck: &mut Deck, intent: &ModificationIntent, rules: &FormatRules) -> CardforgeResult<()> {
        if intent.card_changes.is_empty() {
            return Err(EngineError::EmptyRefinementPlan.into());
        }
        deck.cards.retain(|dc| dc.card.is_land());
        for change in &intent.card_changes {
            self.add_card(deck, &change.card_name, change.quantity.max(1), rules).await?;
        }
        Ok(())
    }

    async fn add_card(&self, deck: &mut Deck, card_name: &str, quantity: u32, rules: &FormatRules) -> CardforgeResult<()> {
        let card = self
            .repository
            .get_by_name(card_name)
            .await?
            .ok_or_else(|| EngineError::UnresolvedCard(card_name.to_string()))?;

        let capped = if card.is_basic_land() {
            quantity
        } else if card.is_legendary() {
            quantity.min(rules.legendary_max).max(1)
        } else if rules.singleton {
            quantity.min(1)
        } else {
            quantity.min(rules.copy_limit)
        };

        if let Some(existing) = deck.cards.iter_mut().find(|dc| dc.card.id == card.id) {
            existing.quantity = (existing.quantity + capped).min(if card.is_basic_land() { u32::MAX } else { rules.copy_limit.max(capped) });
        } else {
            deck.cards.push(DeckCard::new(Arc::new(card), capped));
        }
        Ok(())
    }

    /// Modification requests don't always land exactly on the format's deck
    /// size; trim or fill with basics to reconcile rather than leaving an
    /// off-size deck, mirroring the builder's fill/trim logic.
    async fn reconcile_size(&self, deck: &mut Deck, rules: &FormatRules) -> CardforgeResult<()> {
        let target = rules.deck_size;
        let total = deck.total_cards();
        if total == target {
            return Ok(());
        }
        if total > target {
            let mut excess = total - target;
            let mut non_land: Vec<usize> = deck
                .cards
                .iter()
                .enumerate()
                .filter(|(_, dc)| !dc.card.is_land())
                .map(|(i, _)| i)
                .collect();
            non_land.sort_by(|a, b| {
                deck.cards[*b].card.cmc.partial_cmp(&deck.cards[*a].card.cmc).unwrap_or(std::cmp::Ordering::Equal)
            });
            for idx in non_land {
                if excess == 0 {
                    break;
                }
                let take = excess.min(deck.cards[idx].quantity.saturating_sub(1).max(if deck.cards[idx].quantity > 1 { 1 } else { 0 }));
                let take = take.max(1).min(deck.cards[idx].quantity);
                deck.cards[idx].quantity -= take;
                excess = excess.saturating_sub(take);
            }
            deck.cards.retain(|dc| dc.quantity > 0);
            if deck.total_cards() != target {
                return Err(EngineError::SizeReconciliationFailed { required: target, actual: deck.total_cards() }.into());
            }
            Ok(())
        } else {
            let colors = deck.color_identity();
            let shortfall = target - total;
            crate::builder::add_basic_lands(&self.repository, deck, colors, shortfall).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{Archetype, Card, DeckCard, Format, Rarity};
    use cardforge_llm::{CardChange, InProcessVectorIndex, IntentType};
    use cardforge_storage::{CacheBackend, CatalogStore, InMemoryCatalogStore, TieredCache};
    use std::collections::HashMap as StdHashMap;

    fn spell(name: &str, cmc: f32) -> DeckCard {
        let card = Card {
            id: cardforge_core::CardId::now_v7(),
            name: name.to_string(),
            mana_cost: String::new(),
            cmc,
            colors: cardforge_core::Color::RED,
            color_identity: cardforge_core::Color::RED,
            type_line: "Creature".to_string(),
            type_list: vec!["Creature".to_string()],
            subtype_list: vec![],
            oracle_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Common,
            legalities: StdHashMap::new(),
            keywords: vec![],
        };
        DeckCard::new(Arc::new(card), 1)
    }

    fn executor() -> ModificationExecutor {
        let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new(Vec::new()));
        let cache: Arc<dyn CacheBackend<Card>> = Arc::new(TieredCache::with_defaults());
        let vector_index = Arc::new(InProcessVectorIndex::new());
        let llm = Arc::new(ProviderRegistry::with_round_robin());
        let repository = Arc::new(CardRepository::new(catalog, cache, vector_index, llm.clone()));
        ModificationExecutor::new(repository, llm)
    }

    fn intent(card_changes: Vec<CardChange>) -> ModificationIntent {
        ModificationIntent {
            intent_type: IntentType::Remove,
            description: "test".to_string(),
            card_changes,
            constraints: vec![],
            confidence: 1.0,
        }
    }

    #[test]
    fn named_remove_decrements_one_matching_entry() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(spell("Goblin Guide", 1.0));
        let change = CardChange { card_name: "Goblin Guide".to_string(), quantity: 1, replacement_card_name: None, min_cmc: None, max_cmc: None };
        executor().execute_remove(&mut deck, &intent(vec![change]));
        assert!(deck.cards.is_empty());
    }

    #[test]
    fn cmc_predicate_remove_drops_every_matching_non_land_card() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(spell("Krenko, Mob Boss", 6.0));
        deck.cards.push(spell("Wurmcoil Engine", 7.0));
        deck.cards.push(spell("Goblin Guide", 1.0));
        let change = CardChange { card_name: String::new(), quantity: 0, replacement_card_name: None, min_cmc: Some(6.0), max_cmc: None };
        executor().execute_remove(&mut deck, &intent(vec![change]));
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.cards[0].card.name, "Goblin Guide");
    }

    #[test]
    fn cmc_predicate_never_touches_lands() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(DeckCard::new(Arc::new(mountain()), 20));
        let change = CardChange { card_name: String::new(), quantity: 0, replacement_card_name: None, min_cmc: Some(0.0), max_cmc: None };
        executor().execute_remove(&mut deck, &intent(vec![change]));
        assert_eq!(deck.cards.len(), 1);
    }

    fn mountain() -> Card {
        Card {
            id: cardforge_core::CardId::now_v7(),
            name: "Mountain".to_string(),
            mana_cost: String::new(),
            cmc: 0.0,
            colors: cardforge_core::Color::empty(),
            color_identity: cardforge_core::Color::RED,
            type_line: "Basic Land".to_string(),
            type_list: vec!["Land".to_string()],
            subtype_list: vec!["Mountain".to_string()],
            oracle_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Common,
            legalities: StdHashMap::new(),
            keywords: vec![],
        }
    }
}

