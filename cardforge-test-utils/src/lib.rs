//! Test fixtures and builders for the Cardforge workspace.
//!
//! Centralizes the card/deck construction boilerplate every crate's test
//! suite otherwise repeats by hand, plus thin wiring helpers for standing up
//! an in-memory [`CardRepository`] and [`Orchestrator`] against a
//! [`MockLlmProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use cardforge_core::{Archetype, Card, CardId, Color, Deck, DeckCard, Format, Rarity};
use cardforge_engine::{CardRepository, Orchestrator};
use cardforge_llm::{InProcessVectorIndex, MockLlmProvider, ProviderRegistry};
use cardforge_storage::{CacheBackend, CatalogStore, InMemoryCatalogStore, TieredCache};
use serde_json::Value;

pub use cardforge_llm::MockLlmProvider as MockProvider;

/// Builds a [`Card`] with sensible defaults, overridable field by field.
/// Mirrors the fixture pattern used throughout `cardforge-core`'s own unit
/// tests, lifted out so engine- and api-level tests don't each redefine it.
#[derive(Debug, Clone)]
pub struct CardBuilder {
    card: Card,
}

impl CardBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            card: Card {
                id: CardId::now_v7(),
                name: name.into(),
                mana_cost: "{1}{R}".to_string(),
                cmc: 1.0,
                colors: Color::RED,
                color_identity: Color::RED,
                type_line: "Creature — Goblin".to_string(),
                type_list: vec!["Creature".to_string()],
                subtype_list: vec!["Goblin".to_string()],
                oracle_text: String::new(),
                power: Some("1".to_string()),
                toughness: Some("1".to_string()),
                loyalty: None,
                set_code: "TST".to_string(),
                rarity: Rarity::Common,
                legalities: HashMap::from([
                    (Format::Standard, true),
                    (Format::Pioneer, true),
                    (Format::Modern, true),
                    (Format::Legacy, true),
                    (Format::Vintage, true),
                    (Format::Commander, true),
                ]),
                keywords: Vec::new(),
            },
        }
    }

    pub fn cmc(mut self, cmc: f32) -> Self {
        self.card.cmc = cmc;
        self
    }

    pub fn colors(mut self, colors: Color) -> Self {
        self.card.colors = colors;
        self.card.color_identity = colors;
        self
    }

    pub fn type_line(mut self, type_line: impl Into<String>) -> Self {
        let type_line = type_line.into();
        self.card.type_list = type_line
            .split_whitespace()
            .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
            .map(|w| w.trim_end_matches('—').to_string())
            .collect();
        self.card.type_line = type_line;
        self
    }

    pub fn oracle_text(mut self, text: impl Into<String>) -> Self {
        self.card.oracle_text = text.into();
        self
    }

    pub fn legendary(mut self) -> Self {
        self.card.type_line = format!("Legendary {}", self.card.type_line);
        self.card.type_list.insert(0, "Legendary".to_string());
        self
    }

    pub fn legal_in(mut self, format: Format, legal: bool) -> Self {
        self.card.legalities.insert(format, legal);
        self
    }

    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.card.keywords = keywords;
        self
    }

    pub fn build(self) -> Card {
        self.card
    }
}

/// A basic land card, exempt from copy limits, legal everywhere.
pub fn basic_land(name: &str, color: Color) -> Card {
    const BASICS: &[(&str, &str)] = &[
        ("Plains", "W"),
        ("Island", "U"),
        ("Swamp", "B"),
        ("Mountain", "R"),
        ("Forest", "G"),
    ];
    debug_assert!(BASICS.iter().any(|(n, _)| *n == name), "not a basic land name: {name}");
    Card {
        id: CardId::now_v7(),
        name: name.to_string(),
        mana_cost: String::new(),
        cmc: 0.0,
        colors: Color::empty(),
        color_identity: color,
        type_line: "Basic Land".to_string(),
        type_list: vec!["Land".to_string()],
        subtype_list: vec![name.to_string()],
        oracle_text: format!("({{T}}: Add {{{}}}.)", color.to_letters()),
        power: None,
        toughness: None,
        loyalty: None,
        set_code: "TST".to_string(),
        rarity: Rarity::Common,
        legalities: HashMap::from([
            (Format::Standard, true),
            (Format::Pioneer, true),
            (Format::Modern, true),
            (Format::Legacy, true),
            (Format::Vintage, true),
            (Format::Commander, true),
        ]),
        keywords: Vec::new(),
    }
}

/// A small but representative catalog: one or two low-curve creatures per
/// color, a removal spell, and all five basic lands. Enough for builder and
/// analyzer tests to assemble a legal, non-trivial deck.
pub fn sample_catalog() -> Vec<Card> {
    vec![
        CardBuilder::new("Goblin Guide")
            .cmc(1.0)
            .colors(Color::RED)
            .type_line("Creature — Goblin")
            .build(),
        CardBuilder::new("Lightning Bolt")
            .cmc(1.0)
            .colors(Color::RED)
            .type_line("Instant")
            .oracle_text("Lightning Bolt deals 3 damage to any target.")
            .build(),
        CardBuilder::new("Krenko, Mob Boss")
            .cmc(3.0)
            .colors(Color::RED)
            .type_line("Legendary Creature — Goblin")
            .legendary()
            .build(),
        CardBuilder::new("Savannah Lions")
            .cmc(1.0)
            .colors(Color::WHITE)
            .type_line("Creature — Cat")
            .build(),
        CardBuilder::new("Counterspell")
            .cmc(2.0)
            .colors(Color::BLUE)
            .type_line("Instant")
            .build(),
        basic_land("Mountain", Color::RED),
        basic_land("Plains", Color::WHITE),
        basic_land("Island", Color::BLUE),
        basic_land("Swamp", Color::BLACK),
        basic_land("Forest", Color::GREEN),
    ]
}

/// A minimal but legal deck: enough lands to hit the format's ideal land
/// count plus one non-land card, repeated as needed. Useful as a seed for
/// modification-executor and quality-analyzer tests that need a deck
/// already shaped roughly like a real one.
pub fn sample_deck(format: Format, archetype: Archetype) -> Deck {
    let rules = cardforge_core::FormatRules::for_format(format);
    let mut deck = Deck::new("Sample Deck", format, archetype);
    let land = Arc::new(basic_land("Mountain", Color::RED));
    let land_count = cardforge_core::FormatRules::ideal_land_count(format, archetype);
    deck.cards.push(DeckCard::new(land, land_count));

    let spell = Arc::new(CardBuilder::new("Goblin Guide").cmc(1.0).colors(Color::RED).build());
    let remaining = rules.deck_size - land_count;
    if rules.singleton {
        for i in 0..remaining {
            let unique = Arc::new(
                CardBuilder::new(format!("Singleton Spell {i}"))
                    .cmc((i % 6) as f32)
                    .colors(Color::RED)
                    .build(),
            );
            deck.cards.push(DeckCard::new(unique, 1));
        }
    } else {
        deck.cards.push(DeckCard::new(spell, remaining.min(rules.copy_limit)));
        let leftover = remaining.saturating_sub(rules.copy_limit);
        if leftover > 0 {
            let filler = Arc::new(CardBuilder::new("Filler Spell").cmc(2.0).colors(Color::RED).build());
            deck.cards.push(DeckCard::new(filler, leftover));
        }
    }
    deck
}

/// Wires an in-memory [`CardRepository`] over [`sample_catalog`], a
/// default-sized [`TieredCache`], and an [`InProcessVectorIndex`], backed by
/// the given provider registry.
pub fn in_memory_repository(llm: Arc<ProviderRegistry>) -> Arc<CardRepository> {
    repository_with_catalog(sample_catalog(), llm)
}

/// Same as [`in_memory_repository`] but with a caller-supplied catalog.
pub fn repository_with_catalog(cards: Vec<Card>, llm: Arc<ProviderRegistry>) -> Arc<CardRepository> {
    let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new(cards));
    let cache: Arc<dyn CacheBackend<Card>> = Arc::new(TieredCache::with_defaults());
    let vector_index = Arc::new(InProcessVectorIndex::new());
    Arc::new(CardRepository::new(catalog, cache, vector_index, llm))
}

/// A [`ProviderRegistry`] with a single [`MockLlmProvider`] registered,
/// queued to return `responses` in order on successive `complete` calls.
pub async fn mock_registry(responses: Vec<Value>) -> Arc<ProviderRegistry> {
    let registry = Arc::new(ProviderRegistry::with_round_robin());
    registry.register(Arc::new(MockLlmProvider::new(responses))).await;
    registry
}

/// An [`Orchestrator`] over [`in_memory_repository`] and [`mock_registry`],
/// with the given quality threshold and iteration bound.
pub async fn test_orchestrator(responses: Vec<Value>, quality_threshold: f32, max_iterations: u32) -> Orchestrator {
    let llm = mock_registry(responses).await;
    let repository = in_memory_repository(llm.clone());
    Orchestrator::new(repository, llm).with_bounds(quality_threshold, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_builder_defaults_are_legal_somewhere() {
        let card = CardBuilder::new("Test Card").build();
        assert!(card.is_legal_in(Format::Standard));
    }

    #[test]
    fn basic_land_is_recognized() {
        let mountain = basic_land("Mountain", Color::RED);
        assert!(mountain.is_basic_land());
    }

    #[test]
    fn sample_catalog_has_one_card_per_basic_color() {
        let catalog = sample_catalog();
        assert!(catalog.iter().any(|c| c.colors.contains(Color::RED) && !c.is_land()));
        assert!(catalog.iter().filter(|c| c.is_basic_land()).count() == 5);
    }

    #[test]
    fn sample_deck_matches_format_size() {
        let deck = sample_deck(Format::Standard, Archetype::Aggro);
        assert_eq!(deck.total_cards(), 60);

        let commander = sample_deck(Format::Commander, Archetype::Control);
        assert_eq!(commander.total_cards(), 100);
        for dc in commander.cards.iter().filter(|dc| !dc.card.is_basic_land()) {
            assert_eq!(dc.quantity, 1, "{} should be singleton", dc.card.name);
        }
    }

    #[tokio::test]
    async fn in_memory_repository_resolves_sample_catalog() {
        let llm = mock_registry(vec![]).await;
        let repo = in_memory_repository(llm);
        let bolt = repo.get_by_name("Lightning Bolt").await.unwrap();
        assert!(bolt.is_some());
    }
}
