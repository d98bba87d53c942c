//! Channel vocabulary.
//!
//! Free-text channel values are matched case-insensitively against an alias
//! table. Placeholders, null tokens in any case, blank text and missing cells
//! become [`UNKNOWN_CHANNEL`]; anything else unrecognized is kept, title-cased.

use std::{
    collections::{HashMap, HashSet},
    sync::OnceLock,
};

use crate::{
    data::{Value, is_null_token_ignore_case},
    error::CleanError,
};

pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// Known spellings, keyed by their trimmed lowercase form.
pub const CHANNEL_ALIASES: &[(&str, &str)] = &[
    ("facebok", "Facebook"),
    ("facebook", "Facebook"),
    ("gogle", "Google Ads"),
    ("google ads", "Google Ads"),
    ("tik_tok", "TikTok"),
    ("tiktok", "TikTok"),
    ("e-mail", "Email"),
    ("email", "Email"),
    ("instagram", "Instagram"),
    ("insta_gram", "Instagram"),
];

pub const PLACEHOLDER_TOKENS: &[&str] = &["n/a", "xx", "invalid", "nan"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVocabulary {
    aliases: HashMap<String, String>,
    placeholders: HashSet<String>,
}

impl Default for ChannelVocabulary {
    fn default() -> Self {
        let mut vocabulary = Self {
            aliases: HashMap::new(),
            placeholders: PLACEHOLDER_TOKENS.iter().map(|t| t.to_string()).collect(),
        };
        for (variant, canonical) in CHANNEL_ALIASES {
            vocabulary
                .aliases
                .insert(variant.to_string(), canonical.to_string());
        }
        vocabulary
    }
}

impl ChannelVocabulary {
    /// Registers `variant` for `canonical`. The canonical name is registered
    /// under its own lowercase form too, so normalizing it again is a no-op.
    pub fn insert_alias(&mut self, variant: &str, canonical: &str) -> Result<(), CleanError> {
        let canonical = canonical.trim();
        let keys = [variant.trim().to_lowercase(), canonical.to_lowercase()];
        for key in &keys {
            if let Some(existing) = self.aliases.get(key)
                && existing != canonical
            {
                return Err(CleanError::ConflictingAlias {
                    variant: key.clone(),
                    existing: existing.clone(),
                    requested: canonical.to_string(),
                });
            }
        }
        for key in keys {
            self.aliases.insert(key, canonical.to_string());
        }
        Ok(())
    }

    pub fn insert_placeholder(&mut self, token: &str) {
        self.placeholders.insert(token.trim().to_lowercase());
    }

    pub fn canonical_names(&self) -> HashSet<&str> {
        self.aliases.values().map(String::as_str).collect()
    }

    pub fn normalize_text(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let key = trimmed.to_lowercase();
        if key.is_empty()
            || self.placeholders.contains(&key)
            || is_null_token_ignore_case(trimmed)
        {
            return UNKNOWN_CHANNEL.to_string();
        }
        let normalized = match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => title_case(trimmed),
        };
        // A written value that reloads as missing would become Unknown on the
        // next pass.
        if Value::from_raw(&normalized).is_missing() {
            UNKNOWN_CHANNEL.to_string()
        } else {
            normalized
        }
    }

    pub fn normalize(&self, value: &Value) -> String {
        match value {
            Value::Missing => UNKNOWN_CHANNEL.to_string(),
            Value::Text(raw) => self.normalize_text(raw),
            other => self.normalize_text(&other.as_display()),
        }
    }
}

/// Normalizes against the built-in vocabulary.
pub fn normalize_channel(raw: Option<&str>) -> String {
    static DEFAULT: OnceLock<ChannelVocabulary> = OnceLock::new();
    let vocabulary = DEFAULT.get_or_init(ChannelVocabulary::default);
    match raw {
        Some(text) => vocabulary.normalize_text(text),
        None => UNKNOWN_CHANNEL.to_string(),
    }
}

/// Uppercases the first letter of every alphabetic run and lowercases the
/// rest: `snap ads` -> `Snap Ads`, `SnapAds` -> `Snapads`, `3m_promo` -> `3M_Promo`.
pub fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_word = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if in_word {
                output.extend(ch.to_lowercase());
            } else {
                // `ß` uppercases to `SS`; only the first letter of the
                // expansion stays upper so the result is a fixed point.
                let mut upper = ch.to_uppercase();
                output.extend(upper.next());
                output.extend(upper.flat_map(char::to_lowercase));
            }
            in_word = true;
        } else {
            output.push(ch);
            in_word = false;
        }
    }
    output
}

/// Rewrites a column to canonical channel names; returns how many cells ended
/// up as [`UNKNOWN_CHANNEL`].
pub fn normalize_channels(cells: &mut [Value], vocabulary: &ChannelVocabulary) -> usize {
    let mut unknown = 0;
    for cell in cells.iter_mut() {
        let canonical = vocabulary.normalize(cell);
        if canonical == UNKNOWN_CHANNEL {
            unknown += 1;
        }
        *cell = Value::Text(canonical);
    }
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_canonical_names() {
        assert_eq!(normalize_channel(Some("facebok")), "Facebook");
        assert_eq!(normalize_channel(Some("  GOGLE ")), "Google Ads");
        assert_eq!(normalize_channel(Some("tik_tok")), "TikTok");
        assert_eq!(normalize_channel(Some("e-mail")), "Email");
        assert_eq!(normalize_channel(Some("Insta_Gram")), "Instagram");
    }

    #[test]
    fn placeholders_and_missing_are_unknown() {
        assert_eq!(normalize_channel(Some("xx")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some("N/A")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some("Invalid")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some("   ")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(None), UNKNOWN_CHANNEL);
        assert_eq!(
            ChannelVocabulary::default().normalize(&Value::Missing),
            UNKNOWN_CHANNEL
        );
    }

    #[test]
    fn unrecognized_values_are_title_cased() {
        assert_eq!(normalize_channel(Some("SnapAds")), "Snapads");
        assert_eq!(normalize_channel(Some("linked in")), "Linked In");
        assert_eq!(title_case("3m_promo"), "3M_Promo");
    }

    #[test]
    fn multi_letter_uppercase_expansions_are_stable() {
        assert_eq!(title_case("ßpot"), "Sspot");
        assert_eq!(normalize_channel(Some("ßpot")), "Sspot");
        assert_eq!(normalize_channel(Some("Sspot")), "Sspot");
        assert_eq!(title_case("ﬁnd"), "Find");
    }

    #[test]
    fn null_tokens_in_any_case_are_unknown() {
        assert_eq!(normalize_channel(Some("#n/a")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some(" none")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some("NULL")), UNKNOWN_CHANNEL);
        assert_eq!(normalize_channel(Some("<na>")), UNKNOWN_CHANNEL);
    }

    #[test]
    fn canonical_names_are_fixed_points() {
        let vocabulary = ChannelVocabulary::default();
        for name in vocabulary.canonical_names() {
            assert_eq!(vocabulary.normalize_text(name), name);
        }
        assert_eq!(normalize_channel(Some(UNKNOWN_CHANNEL)), UNKNOWN_CHANNEL);
    }

    #[test]
    fn insert_alias_registers_canonical_form() {
        let mut vocabulary = ChannelVocabulary::default();
        vocabulary.insert_alias("linkdin", "LinkedIn").unwrap();
        assert_eq!(vocabulary.normalize_text("Linkdin"), "LinkedIn");
        assert_eq!(vocabulary.normalize_text("LinkedIn"), "LinkedIn");
    }

    #[test]
    fn insert_alias_rejects_conflicts() {
        let mut vocabulary = ChannelVocabulary::default();
        let err = vocabulary.insert_alias("facebok", "Meta").unwrap_err();
        assert!(matches!(err, CleanError::ConflictingAlias { .. }));
    }
}
