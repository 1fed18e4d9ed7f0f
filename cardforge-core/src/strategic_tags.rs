//! Strategic tag generation.
//!
//! Deterministic, language-neutral string matching over a card's oracle text
//! and type line. Tags feed both embedding text generation
//! ([`crate::Card::embedding_text`]) and the quality analyzer's synergy
//! sub-score, so the taxonomy lives here rather than in either consumer.

/// Derive the set of strategic tags for a card from its oracle text and type
/// line. Order is stable (taxonomy order, not input order) so embedding text
/// is reproducible across calls.
pub fn derive_strategic_tags(oracle_text: &str, type_line: &str, subtype_list: &[String]) -> Vec<String> {
    let text = oracle_text.to_lowercase();
    let type_lower = type_line.to_lowercase();
    let mut tags = Vec::new();

    // Synergy tags: mechanical themes the card plugs into.
    if text.contains("graveyard") {
        tags.push("synergy:graveyard".to_string());
    }
    if text.contains("+1/+1 counter") {
        tags.push("synergy:counters".to_string());
    }
    if type_lower.contains("artifact") || text.contains("artifact") {
        tags.push("synergy:artifacts".to_string());
    }
    if text.contains("enchantment") {
        tags.push("synergy:enchantments".to_string());
    }
    if text.contains("sacrifice") {
        tags.push("synergy:sacrifice".to_string());
    }
    if text.contains("token") {
        tags.push("synergy:tokens".to_string());
    }
    if text.contains("draw a card") || text.contains("draw two cards") || text.contains("draw cards") {
        tags.push("role:card-advantage".to_string());
    }
    if !subtype_list.is_empty() && type_lower.contains("creature") {
        tags.push("synergy:tribal".to_string());
    }

    // Anti-synergy tags: mechanics that undercut common strategies.
    if text.contains("exile") && text.contains("graveyard") {
        tags.push("anti-synergy:graveyard-hate".to_string());
    }
    if text.contains("each player discards") || text.contains("all players discard") {
        tags.push("anti-synergy:symmetric-discard".to_string());
    }

    // Role tags: the functional job the card does in a deck.
    if text.contains("destroy target creature")
        || text.contains("deal") && text.contains("damage to target creature")
        || text.contains("exile target creature")
    {
        tags.push("role:removal".to_string());
    }
    if text.contains("search your library for a land") || text.contains("add one mana of any color") {
        tags.push("role:ramp".to_string());
    }
    if text.contains("counter target spell") {
        tags.push("role:counterspell".to_string());
    }
    if text.contains("gain life") || text.contains("gain") && text.contains("life") {
        tags.push("role:lifegain".to_string());
    }
    if text.contains("flying") && (text.contains("can't be blocked") || text.contains("unblockable")) {
        tags.push("role:evasive-finisher".to_string());
    }

    // Format-fit tags: cheap, broadly applicable effects.
    if text.contains("deal 1 damage") || text.contains("deal 2 damage") {
        tags.push("format:aggro-fit".to_string());
    }
    if type_lower.contains("land") {
        tags.push("format:manabase".to_string());
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_spell_tagged() {
        let tags = derive_strategic_tags("Destroy target creature.", "Instant", &[]);
        assert!(tags.contains(&"role:removal".to_string()));
    }

    #[test]
    fn graveyard_synergy_and_hate_both_detected() {
        let tags = derive_strategic_tags(
            "Return target creature card from your graveyard to your hand. Exile target card from a graveyard.",
            "Instant",
            &[],
        );
        assert!(tags.contains(&"synergy:graveyard".to_string()));
        assert!(tags.contains(&"anti-synergy:graveyard-hate".to_string()));
    }

    #[test]
    fn basic_land_gets_manabase_tag_and_nothing_else() {
        let tags = derive_strategic_tags("", "Basic Land - Mountain", &["Mountain".to_string()]);
        assert_eq!(tags, vec!["format:manabase".to_string()]);
    }

    #[test]
    fn vanilla_creature_has_no_tags() {
        let tags = derive_strategic_tags("", "Creature - Bear", &["Bear".to_string()]);
        assert!(tags.contains(&"synergy:tribal".to_string()));
    }
}
