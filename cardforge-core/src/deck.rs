//! The [`Deck`] and [`DeckCard`] data model.

use crate::{Archetype, Card, CardforgeResult, Color, CoreError, DeckId, Format, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A card entry within a deck: a shared reference to the catalog `Card` plus
/// the quantity of copies included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeckCard {
    pub card: Arc<Card>,
    pub quantity: u32,
}

impl DeckCard {
    pub fn new(card: Arc<Card>, quantity: u32) -> Self {
        Self { card, quantity }
    }

    /// Validate this entry's quantity against format copy/singleton/
    /// legendary rules. Basic lands are exempt from the copy limit.
    pub fn validate_quantity(&self, copy_limit: u32, singleton: bool) -> CardforgeResult<()> {
        if self.quantity == 0 {
            return Err(CoreError::InvalidQuantity {
                card_name: self.card.name.clone(),
                quantity: self.quantity as i32,
            }
            .into());
        }

        if self.card.is_basic_land() {
            return Ok(());
        }

        if self.card.is_legendary() && self.quantity > 1 {
            return Err(CoreError::LegendaryViolation {
                card_name: self.card.name.clone(),
            }
            .into());
        }

        if singleton && self.quantity > 1 {
            return Err(CoreError::SingletonViolation {
                card_name: self.card.name.clone(),
            }
            .into());
        }

        if self.quantity > copy_limit {
            return Err(CoreError::CopyLimitExceeded {
                card_name: self.card.name.clone(),
                limit: copy_limit,
            }
            .into());
        }

        Ok(())
    }
}

/// A constructed deck: an unordered bag of [`DeckCard`]s plus format
/// metadata. Mutated only by the agent builder or modification executor
/// while owned by an active orchestration; persisted immutably (snapshotted
/// with a UUID) by the deck store thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub format: Format,
    pub archetype: Archetype,
    pub cards: Vec<DeckCard>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Deck {
    pub fn new(name: impl Into<String>, format: Format, archetype: Archetype) -> Self {
        let now = crate::now();
        Self {
            id: DeckId::now_v7(),
            name: name.into(),
            format,
            archetype,
            cards: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of every card's quantity.
    pub fn total_cards(&self) -> u32 {
        self.cards.iter().map(|dc| dc.quantity).sum()
    }

    /// Union of every card's color identity.
    pub fn color_identity(&self) -> Color {
        self.cards
            .iter()
            .fold(Color::empty(), |acc, dc| acc | dc.card.color_identity)
    }

    /// Quantity of a named card currently in the deck, or 0 if absent.
    pub fn quantity_of(&self, card_name: &str) -> u32 {
        self.cards
            .iter()
            .find(|dc| dc.card.name.eq_ignore_ascii_case(card_name))
            .map(|dc| dc.quantity)
            .unwrap_or(0)
    }

    /// Number of non-land cards, used by curve and land-ratio scoring.
    pub fn non_land_cards(&self) -> impl Iterator<Item = &DeckCard> {
        self.cards.iter().filter(|dc| !dc.card.is_land())
    }

    /// Count of land cards (by quantity), used by land-ratio scoring.
    pub fn land_count(&self) -> u32 {
        self.cards
            .iter()
            .filter(|dc| dc.card.is_land())
            .map(|dc| dc.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rarity;
    use std::collections::HashMap;

    fn land(name: &str) -> Arc<Card> {
        Arc::new(Card {
            id: crate::CardId::now_v7(),
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

    fn legendary_creature(name: &str, color: Color) -> Arc<Card> {
        Arc::new(Card {
            id: crate::CardId::now_v7(),
            name: name.to_string(),
            mana_cost: "{1}{R}".to_string(),
            cmc: 2.0,
            colors: color,
            color_identity: color,
            type_line: "Legendary Creature — Goblin".to_string(),
            type_list: vec!["Legendary".to_string(), "Creature".to_string()],
            subtype_list: vec!["Goblin".to_string()],
            oracle_text: String::new(),
            power: Some("2".to_string()),
            toughness: Some("2".to_string()),
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Rare,
            legalities: HashMap::new(),
            keywords: vec![],
        })
    }

    #[test]
    fn basic_land_quantity_unbounded() {
        let dc = DeckCard::new(land("Mountain"), 24);
        assert!(dc.validate_quantity(4, false).is_ok());
    }

    #[test]
    fn legendary_quantity_capped_at_one() {
        let dc = DeckCard::new(legendary_creature("Krenko, Mob Boss", Color::RED), 2);
        assert!(dc.validate_quantity(4, false).is_err());
    }

    #[test]
    fn singleton_format_rejects_multiple_copies() {
        let dc = DeckCard::new(legendary_creature("Krenko, Mob Boss", Color::RED), 1);
        assert!(dc.validate_quantity(1, true).is_ok());

        let nonlegendary = Arc::new(Card {
            id: crate::CardId::now_v7(),
            name: "Sol Ring".to_string(),
            mana_cost: "{1}".to_string(),
            cmc: 1.0,
            colors: Color::empty(),
            color_identity: Color::empty(),
            type_line: "Artifact".to_string(),
            type_list: vec!["Artifact".to_string()],
            subtype_list: vec![],
            oracle_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Uncommon,
            legalities: HashMap::new(),
            keywords: vec![],
        });
        let dc = DeckCard::new(nonlegendary, 2);
        assert!(dc.validate_quantity(1, true).is_err());
    }

    #[test]
    fn deck_totals_and_color_identity() {
        let mut deck = Deck::new("Test Deck", Format::Standard, Archetype::Aggro);
        deck.cards.push(DeckCard::new(land("Mountain"), 20));
        deck.cards
            .push(DeckCard::new(legendary_creature("Krenko, Mob Boss", Color::RED), 1));

        assert_eq!(deck.total_cards(), 21);
        assert_eq!(deck.color_identity(), Color::RED);
        assert_eq!(deck.land_count(), 20);
        assert_eq!(deck.quantity_of("krenko, mob boss"), 1);
    }
}
