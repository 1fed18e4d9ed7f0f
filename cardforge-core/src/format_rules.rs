//! Static per-format and per-archetype rule tables.
//!
//! Pure data, no I/O. The analyzer and the agent builder both consult these
//! tables so curve/land targets and copy/singleton/legendary limits never
//! drift between the two components.

use crate::{Archetype, Format};

/// Number of CMC buckets tracked by [`FormatRules::ideal_curve`]: 0, 1, 2,
/// 3, 4, 5, and "6 or more".
pub const CURVE_BUCKETS: usize = 7;

/// Bucket a converted mana cost into `0..=6`, with `6` meaning "6 or more".
pub fn cmc_bucket(cmc: f32) -> usize {
    (cmc.max(0.0) as usize).min(CURVE_BUCKETS - 1)
}

/// Static rules for a single format: deck size, copy limit, singleton-ness,
/// and the legendary-copy ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatRules {
    pub format: Format,
    pub deck_size: u32,
    pub copy_limit: u32,
    pub singleton: bool,
    pub legendary_max: u32,
}

impl FormatRules {
    /// Look up the static rules for a format.
    pub const fn for_format(format: Format) -> FormatRules {
        match format {
            Format::Standard => FormatRules {
                format,
                deck_size: 60,
                copy_limit: 4,
                singleton: false,
                legendary_max: 1,
            },
            Format::Pioneer => FormatRules {
                format,
                deck_size: 60,
                copy_limit: 4,
                singleton: false,
                legendary_max: 1,
            },
            Format::Modern => FormatRules {
                format,
                deck_size: 60,
                copy_limit: 4,
                singleton: false,
                legendary_max: 1,
            },
            Format::Legacy => FormatRules {
                format,
                deck_size: 60,
                copy_limit: 4,
                singleton: false,
                legendary_max: 1,
            },
            Format::Vintage => FormatRules {
                format,
                deck_size: 60,
                copy_limit: 4,
                singleton: false,
                legendary_max: 1,
            },
            Format::Commander => FormatRules {
                format,
                deck_size: 100,
                copy_limit: 1,
                singleton: true,
                legendary_max: 1,
            },
        }
    }

    /// Shorthand: `true` for formats with `copy_limit == 1`.
    pub fn is_singleton(format: Format) -> bool {
        Self::for_format(format).singleton
    }

    /// Ideal land count for a (format, archetype) pair. Scaled
    /// proportionally from a 60-card baseline fraction for formats with a
    /// different deck size (i.e. Commander).
    pub fn ideal_land_count(format: Format, archetype: Archetype) -> u32 {
        let baseline_60 = match archetype {
            Archetype::Aggro => 15,
            Archetype::Midrange => 17,
            Archetype::Control => 18,
            Archetype::Combo => 16,
            Archetype::Tempo => 16,
            Archetype::Ramp => 17,
            Archetype::Other => 17,
        };
        let rules = Self::for_format(format);
        if rules.deck_size == 60 {
            baseline_60
        } else {
            ((baseline_60 as f32 / 60.0) * rules.deck_size as f32).round() as u32
        }
    }

    /// Ideal fraction of non-land cards at each CMC bucket, indexed
    /// `0..=6` (bucket 6 means "6 or more"). Always sums to 1.0.
    pub fn ideal_curve(archetype: Archetype) -> [f32; CURVE_BUCKETS] {
        match archetype {
            Archetype::Aggro => [0.05, 0.30, 0.30, 0.20, 0.10, 0.03, 0.02],
            Archetype::Midrange => [0.03, 0.15, 0.25, 0.25, 0.17, 0.10, 0.05],
            Archetype::Control => [0.02, 0.10, 0.18, 0.22, 0.20, 0.15, 0.13],
            Archetype::Combo => [0.05, 0.20, 0.25, 0.20, 0.15, 0.10, 0.05],
            Archetype::Tempo => [0.05, 0.25, 0.30, 0.20, 0.12, 0.05, 0.03],
            Archetype::Ramp => [0.03, 0.12, 0.20, 0.20, 0.15, 0.15, 0.15],
            Archetype::Other => [0.08, 0.18, 0.22, 0.20, 0.15, 0.10, 0.07],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_commander_is_singleton() {
        for format in [
            Format::Standard,
            Format::Pioneer,
            Format::Modern,
            Format::Legacy,
            Format::Vintage,
        ] {
            assert!(!FormatRules::is_singleton(format));
        }
        assert!(FormatRules::is_singleton(Format::Commander));
    }

    #[test]
    fn singleton_formats_have_copy_limit_one() {
        for format in [
            Format::Standard,
            Format::Pioneer,
            Format::Modern,
            Format::Legacy,
            Format::Vintage,
            Format::Commander,
        ] {
            let rules = FormatRules::for_format(format);
            if rules.singleton {
                assert_eq!(rules.copy_limit, 1);
            }
        }
    }

    #[test]
    fn curve_fractions_sum_to_one() {
        for archetype in [
            Archetype::Aggro,
            Archetype::Midrange,
            Archetype::Control,
            Archetype::Combo,
            Archetype::Tempo,
            Archetype::Ramp,
            Archetype::Other,
        ] {
            let curve = FormatRules::ideal_curve(archetype);
            let sum: f32 = curve.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "{:?} sums to {}", archetype, sum);
        }
    }

    #[test]
    fn cmc_bucket_clamps_high_costs() {
        assert_eq!(cmc_bucket(0.0), 0);
        assert_eq!(cmc_bucket(5.0), 5);
        assert_eq!(cmc_bucket(12.0), 6);
    }

    #[test]
    fn commander_land_count_scaled_from_sixty_card_baseline() {
        let standard = FormatRules::ideal_land_count(Format::Standard, Archetype::Control);
        let commander = FormatRules::ideal_land_count(Format::Commander, Archetype::Control);
        assert_eq!(standard, 18);
        assert_eq!(commander, 30);
    }
}
