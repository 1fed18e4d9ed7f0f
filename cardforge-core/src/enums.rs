//! Domain enums for the card catalog and deck construction model.
//!
//! Follows the `normalize_token` / `as_db_str` / `from_db_str` idiom used
//! throughout the lifecycle enums of the wider codebase: string parsing is
//! case- and whitespace-insensitive, and every enum round-trips through a
//! stable database string independent of `Debug`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a token for case/whitespace-insensitive matching: lowercases
/// and trims. Used by every `from_str`-style parser in this module.
fn normalize_token(s: &str) -> String {
    s.trim().to_lowercase()
}

bitflags! {
    /// The five WUBRG colors, used both for a card's color identity and its
    /// color set. Stored as a bitset so identity-subset checks are a single
    /// `&`/`==`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Color: u8 {
        const WHITE = 0b00001;
        const BLUE  = 0b00010;
        const BLACK = 0b00100;
        const RED   = 0b01000;
        const GREEN = 0b10000;
    }
}

// Manual serde implementation for Color (bitflags 2.x + serde)
impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Self::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid Color bits: {:#04x}", bits)))
    }
}

#[cfg(feature = "openapi")]
impl utoipa::ToSchema for Color {
    fn name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("Color")
    }
}

#[cfg(feature = "openapi")]
impl utoipa::PartialSchema for Color {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::SchemaType::Type(
                utoipa::openapi::Type::Integer,
            ))
            .into()
    }
}

impl Color {
    /// Parse a single color word (white/blue/black/red/green) into its flag.
    pub fn from_word(word: &str) -> Option<Color> {
        match normalize_token(word).as_str() {
            "white" | "w" => Some(Color::WHITE),
            "blue" | "u" => Some(Color::BLUE),
            "black" | "b" => Some(Color::BLACK),
            "red" | "r" => Some(Color::RED),
            "green" | "g" => Some(Color::GREEN),
            _ => None,
        }
    }

    /// Render as the canonical short-letter string, e.g. "WUR".
    pub fn to_letters(self) -> String {
        let mut out = String::new();
        if self.contains(Color::WHITE) {
            out.push('W');
        }
        if self.contains(Color::BLUE) {
            out.push('U');
        }
        if self.contains(Color::BLACK) {
            out.push('B');
        }
        if self.contains(Color::RED) {
            out.push('R');
        }
        if self.contains(Color::GREEN) {
            out.push('G');
        }
        out
    }

    /// True if `self` is a subset of `other` (e.g. a card's color identity
    /// is within a deck's declared color identity).
    pub fn is_subset_of(self, other: Color) -> bool {
        other.contains(self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_letters())
    }
}

/// Card rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
}

/// Error parsing an enum value from a free-form string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value '{}' for {}", self.value, self.field)
    }
}

impl std::error::Error for EnumParseError {}

impl Rarity {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Mythic => "mythic",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize_token(s).as_str() {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "mythic" | "mythic rare" => Ok(Self::Mythic),
            other => Err(EnumParseError {
                field: "rarity",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Catalog-format rules regime. Determines deck size, singleton-ness, copy
/// limits, and legality per [`crate::format_rules::FormatRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Format {
    Standard,
    Pioneer,
    Modern,
    Legacy,
    Vintage,
    Commander,
}

impl Format {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Pioneer => "pioneer",
            Self::Modern => "modern",
            Self::Legacy => "legacy",
            Self::Vintage => "vintage",
            Self::Commander => "commander",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize_token(s).as_str() {
            "standard" => Ok(Self::Standard),
            "pioneer" => Ok(Self::Pioneer),
            "modern" => Ok(Self::Modern),
            "legacy" => Ok(Self::Legacy),
            "vintage" => Ok(Self::Vintage),
            "commander" | "edh" => Ok(Self::Commander),
            other => Err(EnumParseError {
                field: "format",
                value: other.to_string(),
            }),
        }
    }

    /// Find the first format named as a substring of free text, used to
    /// parse the `message` field of a chat request. Returns `None` (caller
    /// defaults to [`Format::Standard`]) rather than guessing.
    pub fn detect_in_text(text: &str) -> Option<Format> {
        let lower = text.to_lowercase();
        for fmt in [
            Format::Standard,
            Format::Modern,
            Format::Commander,
            Format::Legacy,
            Format::Vintage,
            Format::Pioneer,
        ] {
            if lower.contains(fmt.as_db_str()) {
                return Some(fmt);
            }
        }
        None
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Declared deck strategy, governing curve and land-count ideals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Archetype {
    Aggro,
    Midrange,
    Control,
    Combo,
    Tempo,
    Ramp,
    Other,
}

impl Archetype {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Aggro => "aggro",
            Self::Midrange => "midrange",
            Self::Control => "control",
            Self::Combo => "combo",
            Self::Tempo => "tempo",
            Self::Ramp => "ramp",
            Self::Other => "other",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match normalize_token(s).as_str() {
            "aggro" => Ok(Self::Aggro),
            "midrange" => Ok(Self::Midrange),
            "control" => Ok(Self::Control),
            "combo" => Ok(Self::Combo),
            "tempo" => Ok(Self::Tempo),
            "ramp" => Ok(Self::Ramp),
            "other" => Ok(Self::Other),
            other => Err(EnumParseError {
                field: "archetype",
                value: other.to_string(),
            }),
        }
    }

    /// Find the first archetype named as a substring of free text. Returns
    /// `None` (caller defaults to [`Archetype::Aggro`]) rather than guessing.
    pub fn detect_in_text(text: &str) -> Option<Archetype> {
        let lower = text.to_lowercase();
        for arch in [
            Archetype::Aggro,
            Archetype::Control,
            Archetype::Midrange,
            Archetype::Combo,
            Archetype::Tempo,
            Archetype::Ramp,
        ] {
            if lower.contains(arch.as_db_str()) {
                return Some(arch);
            }
        }
        None
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}
