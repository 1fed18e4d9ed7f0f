//! Agent builder: turns a parsed deck-construction or refinement request
//! into a structured-output LLM call, then materializes the result into a
//! concrete [`Deck`] subject to format rules (copy limit, singleton,
//! legendary cap, unlimited basics).

use std::collections::HashMap;
use std::sync::Arc;

use cardforge_core::{Archetype, CardforgeResult, Color, Deck, DeckCard, EngineError, Format, FormatRules};
use cardforge_context::{ContextAssembler, PromptPackage};
use cardforge_llm::{CompletionRequest, DeckConstructionPlan, ProviderRegistry, RefinementAction, RefinementActionType, RefinementPlan};

use crate::repository::CardRepository;

const BUILD_PROMPT_TOKEN_BUDGET: i32 = 8_000;
const REFINE_PROMPT_TOKEN_BUDGET: i32 = 6_000;

pub struct AgentBuilder {
    repository: Arc<CardRepository>,
    llm: Arc<ProviderRegistry>,
}

impl AgentBuilder {
    pub fn new(repository: Arc<CardRepository>, llm: Arc<ProviderRegistry>) -> Self {
        Self { repository, llm }
    }

    /// Build an initial deck for `format`/`archetype`/`colors` from a single
    /// structured-output call, materializing the LLM's card selections and
    /// filling any remainder proportional to the declared color split.
    pub async fn build_initial(
        &self,
        name: &str,
        format: Format,
        archetype: Archetype,
        colors: Color,
    ) -> CardforgeResult<Deck> {
        let rules = FormatRules::for_format(format);
        let plan = self.request_construction_plan(format, archetype, colors, &rules).await?;

        let mut deck = Deck::new(name, format, archetype);
        for selection in &plan.card_selections {
            self.apply_selection(&mut deck, &selection.card_name, selection.quantity, &rules).await?;
        }

        self.fill_to_size(&mut deck, colors, &rules).await?;
        self.check_invariants(&deck, &rules)?;
        Ok(deck)
    }

    /// Apply an LLM-generated refinement plan to an existing deck: removes,
    /// then replacements, then additions, in that fixed order, followed by a
    /// rebalance back to the format's deck size.
    pub async fn refine(&self, deck: &mut Deck, metrics: &cardforge_core::QualityMetrics) -> CardforgeResult<()> {
        let rules = FormatRules::for_format(deck.format);
        let plan = self.request_refinement_plan(deck, metrics).await?;

        for action in plan.actions.iter().filter(|a| a.action_type == RefinementActionType::Remove) {
            self.apply_remove(deck, action);
        }
        for action in plan.actions.iter().filter(|a| a.action_type == RefinementActionType::Replace) {
            self.apply_replace(deck, action, &rules).await?;
        }
        for action in plan.actions.iter().filter(|a| a.action_type == RefinementActionType::Add) {
            self.apply_selection(deck, &action.card_name, action.quantity, &rules).await?;
        }

        self.fill_to_size(deck, deck.color_identity(), &rules).await?;
        self.check_invariants(deck, &rules)?;
        Ok(())
    }

    async fn request_construction_plan(
        &self,
        format: Format,
        archetype: Archetype,
        colors: Color,
        rules: &FormatRules,
    ) -> CardforgeResult<DeckConstructionPlan> {
        let package = PromptPackage::new(String::new())
            .with_system(
                "You are a Magic: The Gathering deck-building assistant. Propose a full deck list \
                 for the given format, archetype, and color identity. Respond with JSON matching \
                 the requested schema only.",
            )
            .with_user_prompt(format!(
                "Build a {:?} {:?} deck in colors {} targeting {} total cards ({} lands recommended).",
                archetype,
                format,
                colors.to_letters(),
                rules.deck_size,
                FormatRules::ideal_land_count(format, archetype),
            ))
            .with_format_rules_summary(format!(
                "deck_size={}, copy_limit={}, singleton={}, legendary_max={}",
                rules.deck_size, rules.copy_limit, rules.singleton, rules.legendary_max
            ));

        let assembler = ContextAssembler::new(BUILD_PROMPT_TOKEN_BUDGET);
        let window = assembler.assemble(package);

        let request = CompletionRequest {
            system_prompt: "Magic: The Gathering deck-building assistant.".to_string(),
            user_prompt: window.as_text(),
            schema_name: "DeckConstructionPlan".to_string(),
        };
        let value = self.llm.complete(request).await?;
        serde_json::from_value(value).map_err(|e| {
            cardforge_core::CardforgeError::Llm(cardforge_core::LlmError::InvalidResponse {
                provider: "registry".to_string(),
                reason: format!("construction plan did not match schema: {e}"),
            })
        })
    }

    async fn request_refinement_plan(
        &self,
        deck: &Deck,
        metrics: &cardforge_core::QualityMetrics,
    ) -> CardforgeResult<RefinementPlan> {
        let card_list = deck
            .cards
            .iter()
            .map(|dc| format!("{}x {}", dc.quantity, dc.card.name))
            .collect::<Vec<_>>()
            .join("\n");

        let package = PromptPackage::new(card_list)
            .with_system(
                "You are a Magic: The Gathering deck-building assistant. Given a decklist and its \
                 quality issues, propose add/remove/replace actions that resolve the weakest \
                 scores. Respond with JSON matching the requested schema only.",
            )
            .with_user_prompt(format!("Refine this {:?} deck to address: {}", deck.archetype, metrics.issues.join("; ")))
            .with_metrics_summary(format!(
                "mana_curve={:.2} land_ratio={:.2} synergy={:.2} consistency={:.2} overall={:.2}",
                metrics.mana_curve, metrics.land_ratio, metrics.synergy, metrics.consistency, metrics.overall
            ))
            .with_suggestions(metrics.suggestions.clone());

        let assembler = ContextAssembler::new(REFINE_PROMPT_TOKEN_BUDGET);
        let window = assembler.assemble(package);

        let request = CompletionRequest {
            system_prompt: "Magic: The Gathering deck-building assistant.".to_string(),
            user_prompt: window.as_text(),
            schema_name: "RefinementPlan".to_string(),
        };
        let value = self.llm.complete(request).await?;
        serde_json::from_value(value).map_err(|e| {
            cardforge_core::CardforgeError::Llm(cardforge_core::LlmError::InvalidResponse {
                provider: "registry".to_string(),
                reason: format!("refinement plan did not match schema: {e}"),
            })
        })
    }

    /// Look up a named card and add it to the deck, capping quantity to the
    /// format's copy/singleton/legendary rules. Basic lands are uncapped.
    /// An unresolvable name is reported rather than silently dropped.
    async fn apply_selection(&self, deck: &mut Deck, card_name: &str, quantity: u32, rules: &FormatRules) -> CardforgeResult<()> {
        let card = self
            .repository
            .get_by_name(card_name)
            .await?
            .ok_or_else(|| EngineError::UnresolvedCard(card_name.to_string()))?;

        let capped = Self::cap_quantity(&card, quantity, rules);
        if let Some(existing) = deck.cards.iter_mut().find(|dc| dc.card.id == card.id) {
            existing.quantity = Self::cap_quantity(&card, existing.quantity + capped, rules);
        } else {
            deck.cards.push(DeckCard::new(Arc::new(card), capped));
        }
        Ok(())
    }

    fn apply_remove(&self, deck: &mut Deck, action: &RefinementAction) {
        if let Some(pos) = deck.cards.iter().position(|dc| dc.card.name.eq_ignore_ascii_case(&action.card_name)) {
            let remaining = deck.cards[pos].quantity.saturating_sub(action.quantity);
            if remaining == 0 {
                deck.cards.remove(pos);
            } else {
                deck.cards[pos].quantity = remaining;
            }
        }
    }

    /// Replace `action.card_name` with `action.replacement_card_name`. If
    /// the replacement can't be resolved, the original removal is rolled
    /// back so the deck never ends up short a card because of a bad LLM
    /// suggestion.
    async fn apply_replace(&self, deck: &mut Deck, action: &RefinementAction, rules: &FormatRules) -> CardforgeResult<()> {
        let replacement_name = action.replacement_card_name.as_deref().ok_or_else(|| EngineError::ReplacementUnresolvable {
            original: action.card_name.clone(),
        })?;

        let removed_quantity = deck
            .cards
            .iter()
            .find(|dc| dc.card.name.eq_ignore_ascii_case(&action.card_name))
            .map(|dc| dc.quantity)
            .unwrap_or(action.quantity);

        let snapshot = deck.cards.clone();
        self.apply_remove(deck, action);

        match self.apply_selection(deck, replacement_name, removed_quantity, rules).await {
            Ok(()) => Ok(()),
            Err(e) => {
                deck.cards = snapshot;
                tracing::warn!(error = %e, original = %action.card_name, replacement = %replacement_name, "replacement unresolvable, rolled back");
                Err(EngineError::ReplacementUnresolvable { original: action.card_name.clone() }.into())
            }
        }
    }

    fn cap_quantity(card: &cardforge_core::Card, quantity: u32, rules: &FormatRules) -> u32 {
        if card.is_basic_land() {
            return quantity;
        }
        if card.is_legendary() {
            return quantity.min(rules.legendary_max).max(1);
        }
        if rules.singleton {
            return quantity.min(1);
        }
        quantity.min(rules.copy_limit)
    }

    /// Fill or trim the deck to the format's exact size. Fill adds basic
    /// lands proportional to `colors`; trim removes the highest-CMC
    /// non-land cards first, never touching basics. Returns an error if the
    /// deck can't be reconciled to size (e.g. too few distinct non-basic
    /// cards were resolved to trim from).
    async fn fill_to_size(&self, deck: &mut Deck, colors: Color, rules: &FormatRules) -> CardforgeResult<()> {
        let target = rules.deck_size;
        loop {
            let total = deck.total_cards();
            if total == target {
                return Ok(());
            }
            if total < target {
                add_basic_lands(&self.repository, deck, colors, target - total).await?;
                return Ok(());
            }

            let mut non_land: Vec<_> = deck
                .cards
                .iter()
                .enumerate()
                .filter(|(_, dc)| !dc.card.is_land())
                .collect();
            non_land.sort_by(|(_, a), (_, b)| b.card.cmc.partial_cmp(&a.card.cmc).unwrap_or(std::cmp::Ordering::Equal));

            let Some((idx, _)) = non_land.first().map(|(i, dc)| (*i, *dc)) else {
                return Err(EngineError::SizeReconciliationFailed { required: target, actual: total }.into());
            };

            if deck.cards[idx].quantity > 1 {
                deck.cards[idx].quantity -= 1;
            } else {
                deck.cards.remove(idx);
            }
        }
    }

    /// Post-materialization invariant check: total size, per-card quantity
    /// rules, and color identity containment. Any violation here indicates
    /// a bug in the fill/trim logic above, not a recoverable LLM quirk.
    fn check_invariants(&self, deck: &Deck, rules: &FormatRules) -> CardforgeResult<()> {
        let total = deck.total_cards();
        if total != rules.deck_size {
            return Err(EngineError::SizeReconciliationFailed { required: rules.deck_size, actual: total }.into());
        }
        for dc in &deck.cards {
            dc.validate_quantity(rules.copy_limit, rules.singleton)?;
        }
        Ok(())
    }
}

/// Add `count` basic lands to `deck`, split across the basic land names
/// implied by `colors` proportional to each color's weight among the deck's
/// non-land cards (colors pulling more of the spell base get more sources).
/// Colors tied on weight (including the common all-zero case, before any
/// spells are chosen) split evenly. Shared between the builder's fill pass
/// and the modification executor's size reconciliation so both degrade the
/// same way when lands can't be resolved from the catalog.
pub(crate) async fn add_basic_lands(repository: &CardRepository, deck: &mut Deck, colors: Color, count: u32) -> CardforgeResult<()> {
    if count == 0 {
        return Ok(());
    }
    let basics = basic_land_names(colors);
    if basics.is_empty() {
        return Err(EngineError::SizeReconciliationFailed { required: deck.total_cards() + count, actual: deck.total_cards() }.into());
    }

    let per_basic = proportional_land_counts(deck, &basics, count);

    for (name, quantity) in per_basic {
        if quantity == 0 {
            continue;
        }
        let card = repository
            .get_by_name(name)
            .await?
            .ok_or_else(|| EngineError::UnresolvedCard(name.to_string()))?;
        if let Some(existing) = deck.cards.iter_mut().find(|dc| dc.card.id == card.id) {
            existing.quantity += quantity;
        } else {
            deck.cards.push(DeckCard::new(Arc::new(card), quantity));
        }
    }
    Ok(())
}

/// Weight each basic by how much of the non-land spell base pulls its color,
/// then allocate `count` lands by largest remainder so the totals sum
/// exactly to `count` despite integer rounding.
fn proportional_land_counts(deck: &Deck, basics: &[(&'static str, Color)], count: u32) -> HashMap<&'static str, u32> {
    let mut weights: Vec<u32> = basics
        .iter()
        .map(|(_, color)| {
            deck.non_land_cards()
                .filter(|dc| dc.card.colors.contains(*color))
                .map(|dc| dc.quantity)
                .sum()
        })
        .collect();

    if weights.iter().all(|w| *w == 0) {
        weights = vec![1; basics.len()];
    }

    let total_weight: u32 = weights.iter().sum();
    let exact: Vec<f64> = weights.iter().map(|w| (*w as f64) * (count as f64) / (total_weight as f64)).collect();

    let mut per_basic: HashMap<&'static str, u32> = HashMap::new();
    let mut assigned = 0u32;
    for (i, (name, _)) in basics.iter().enumerate() {
        let share = exact[i].floor() as u32;
        per_basic.insert(name, share);
        assigned += share;
    }

    let mut remainder_order: Vec<usize> = (0..basics.len()).collect();
    remainder_order.sort_by(|&a, &b| {
        let frac_a = exact[a] - exact[a].floor();
        let frac_b = exact[b] - exact[b].floor();
        frac_b.partial_cmp(&frac_a).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut leftover = count - assigned;
    for i in remainder_order {
        if leftover == 0 {
            break;
        }
        *per_basic.get_mut(basics[i].0).unwrap() += 1;
        leftover -= 1;
    }

    per_basic
}

fn basic_land_names(colors: Color) -> Vec<(&'static str, Color)> {
    let mut names = Vec::new();
    if colors.contains(Color::WHITE) {
        names.push(("Plains", Color::WHITE));
    }
    if colors.contains(Color::BLUE) {
        names.push(("Island", Color::BLUE));
    }
    if colors.contains(Color::BLACK) {
        names.push(("Swamp", Color::BLACK));
    }
    if colors.contains(Color::RED) {
        names.push(("Mountain", Color::RED));
    }
    if colors.contains(Color::GREEN) {
        names.push(("Forest", Color::GREEN));
    }
    if names.is_empty() {
        names.push(("Wastes", Color::empty()));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{Archetype, Card, DeckCard, Format, Rarity};
    use std::collections::HashMap as StdHashMap;

    fn spell(colors: Color, quantity: u32) -> DeckCard {
        let card = Card {
            id: cardforge_core::CardId::now_v7(),
            name: format!("Test Spell {:?}", colors),
            mana_cost: String::new(),
            cmc: 2.0,
            colors,
            color_identity: colors,
            type_line: "Instant".to_string(),
            type_list: vec!["Instant".to_string()],
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
        DeckCard::new(Arc::new(card), quantity)
    }

    #[test]
    fn even_weights_split_lands_evenly() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(spell(Color::RED, 10));
        deck.cards.push(spell(Color::BLUE, 10));
        let basics = vec![("Mountain", Color::RED), ("Island", Color::BLUE)];
        let counts = proportional_land_counts(&deck, &basics, 10);
        assert_eq!(counts[&"Mountain"], 5);
        assert_eq!(counts[&"Island"], 5);
    }

    #[test]
    fn heavier_color_gets_proportionally_more_lands() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(spell(Color::RED, 15));
        deck.cards.push(spell(Color::BLUE, 5));
        let basics = vec![("Mountain", Color::RED), ("Island", Color::BLUE)];
        let counts = proportional_land_counts(&deck, &basics, 20);
        assert_eq!(counts[&"Mountain"], 15);
        assert_eq!(counts[&"Island"], 5);
    }

    #[test]
    fn no_non_land_cards_falls_back_to_even_split() {
        let deck = Deck::new("Empty", Format::Standard, Archetype::Aggro);
        let basics = vec![("Mountain", Color::RED), ("Island", Color::BLUE), ("Forest", Color::GREEN)];
        let counts = proportional_land_counts(&deck, &basics, 9);
        assert_eq!(counts[&"Mountain"], 3);
        assert_eq!(counts[&"Island"], 3);
        assert_eq!(counts[&"Forest"], 3);
    }

    #[test]
    fn allocation_always_sums_to_count() {
        let mut deck = Deck::new("Test", Format::Standard, Archetype::Aggro);
        deck.cards.push(spell(Color::RED, 7));
        deck.cards.push(spell(Color::BLUE, 3));
        deck.cards.push(spell(Color::GREEN, 2));
        let basics = vec![("Mountain", Color::RED), ("Island", Color::BLUE), ("Forest", Color::GREEN)];
        let counts = proportional_land_counts(&deck, &basics, 17);
        let total: u32 = counts.values().sum();
        assert_eq!(total, 17);
    }
}
