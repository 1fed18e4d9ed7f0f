//! The catalog [`Card`] entity.

use crate::{CardId, Color, Format, Rarity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single catalog card record. Immutable once ingested: the catalog store
/// never mutates a `Card` in place, only replaces it wholesale during
/// ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Card {
    pub id: CardId,
    /// Case-insensitive-unique by convention; uniqueness is enforced by the
    /// catalog store's name index, not by this type.
    pub name: String,
    pub mana_cost: String,
    /// Converted mana cost. Always non-negative.
    pub cmc: f32,
    pub colors: Color,
    /// Superset of `colors`; used for format legality (e.g. Commander).
    pub color_identity: Color,
    pub type_line: String,
    pub type_list: Vec<String>,
    pub subtype_list: Vec<String>,
    pub oracle_text: String,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    pub set_code: String,
    pub rarity: Rarity,
    pub legalities: HashMap<Format, bool>,
    pub keywords: Vec<String>,
}

impl Card {
    /// True if this card's type line names it a land.
    pub fn is_land(&self) -> bool {
        self.type_list.iter().any(|t| t.eq_ignore_ascii_case("land"))
    }

    /// True if this is one of the five basic lands, exempt from copy limits.
    pub fn is_basic_land(&self) -> bool {
        const BASICS: [&str; 5] = ["plains", "island", "swamp", "mountain", "forest"];
        self.is_land() && BASICS.iter().any(|b| self.name.eq_ignore_ascii_case(b))
    }

    /// True if the type line carries the Legendary supertype.
    pub fn is_legendary(&self) -> bool {
        self.type_line.to_lowercase().contains("legendary")
    }

    /// Legal in the given format, per the ingested legality map. Defaults to
    /// `false` (not legal) for formats absent from the map rather than
    /// assuming legality.
    pub fn is_legal_in(&self, format: Format) -> bool {
        self.legalities.get(&format).copied().unwrap_or(false)
    }

    /// Text assembled for embedding generation: name, type line, mana cost,
    /// color words, oracle text, keywords, and strategic tags. Deterministic
    /// given the same `Card` and tag set.
    pub fn embedding_text(&self, strategic_tags: &[String]) -> String {
        let mut parts = vec![
            self.name.clone(),
            self.type_line.clone(),
            self.mana_cost.clone(),
            self.colors.to_letters(),
            self.oracle_text.clone(),
        ];
        parts.extend(self.keywords.iter().cloned());
        parts.extend(strategic_tags.iter().cloned());
        parts.join(" ")
    }
}

/// A compact summary of a [`Card`], returned by the builder's `search_cards`
/// tool call rather than the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CardSummary {
    pub id: CardId,
    pub name: String,
    pub cmc: f32,
    pub colors: Color,
    pub type_line: String,
    /// Truncated excerpt of oracle text, not the full text.
    pub oracle_text_excerpt: String,
}

impl From<&Card> for CardSummary {
    fn from(card: &Card) -> Self {
        const EXCERPT_LEN: usize = 120;
        let oracle_text_excerpt = if card.oracle_text.len() > EXCERPT_LEN {
            format!("{}…", &card.oracle_text[..EXCERPT_LEN])
        } else {
            card.oracle_text.clone()
        };
        Self {
            id: card.id,
            name: card.name.clone(),
            cmc: card.cmc,
            colors: card.colors,
            type_line: card.type_line.clone(),
            oracle_text_excerpt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card(name: &str, type_line: &str) -> Card {
        Card {
            id: CardId::now_v7(),
            name: name.to_string(),
            mana_cost: "{1}{R}".to_string(),
            cmc: 2.0,
            colors: Color::RED,
            color_identity: Color::RED,
            type_line: type_line.to_string(),
            type_list: type_line
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
            subtype_list: vec![],
            oracle_text: "Deal 2 damage to any target.".to_string(),
            power: None,
            toughness: None,
            loyalty: None,
            set_code: "TST".to_string(),
            rarity: Rarity::Common,
            legalities: HashMap::from([(Format::Standard, true)]),
            keywords: vec![],
        }
    }

    #[test]
    fn basic_land_detection() {
        let mountain = sample_card("Mountain", "Basic Land");
        assert!(mountain.is_land());
        assert!(mountain.is_basic_land());

        let bolt = sample_card("Lightning Bolt", "Instant");
        assert!(!bolt.is_land());
        assert!(!bolt.is_basic_land());
    }

    #[test]
    fn legendary_detection() {
        let commander = sample_card("Krenko, Mob Boss", "Legendary Creature");
        assert!(commander.is_legendary());
    }

    #[test]
    fn legality_defaults_to_false_for_unlisted_format() {
        let bolt = sample_card("Lightning Bolt", "Instant");
        assert!(bolt.is_legal_in(Format::Standard));
        assert!(!bolt.is_legal_in(Format::Commander));
    }

    #[test]
    fn summary_excerpts_long_oracle_text() {
        let mut card = sample_card("Verbose Card", "Sorcery");
        card.oracle_text = "x".repeat(200);
        let summary = CardSummary::from(&card);
        assert!(summary.oracle_text_excerpt.ends_with('…'));
        assert!(summary.oracle_text_excerpt.len() < card.oracle_text.len());
    }
}
