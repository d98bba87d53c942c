//! Optional YAML configuration for a cleaning run.
//!
//! ```yaml
//! channel_aliases:
//!   linkdin: LinkedIn
//!   linkedin: LinkedIn
//! placeholders:
//!   - "-"
//! revenue_per_conversion: 120.0
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clean::channel::ChannelVocabulary;

pub const DEFAULT_REVENUE_PER_CONVERSION: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanConfig {
    /// Extra channel spellings, variant -> canonical display name.
    pub channel_aliases: BTreeMap<String, String>,
    /// Extra tokens that mean "no channel recorded".
    pub placeholders: Vec<String>,
    /// Assumed revenue per conversion used for ROI.
    pub revenue_per_conversion: f64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            channel_aliases: BTreeMap::new(),
            placeholders: Vec::new(),
            revenue_per_conversion: DEFAULT_REVENUE_PER_CONVERSION,
        }
    }
}

impl CleanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: CleanConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Built-in vocabulary extended with this config's aliases and placeholders.
    pub fn vocabulary(&self) -> Result<ChannelVocabulary> {
        let mut vocabulary = ChannelVocabulary::default();
        for (variant, canonical) in &self.channel_aliases {
            vocabulary.insert_alias(variant, canonical)?;
        }
        for token in &self.placeholders {
            vocabulary.insert_placeholder(token);
        }
        Ok(vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: CleanConfig = serde_yaml::from_str("placeholders: ['-']\n").unwrap();
        assert_eq!(config.placeholders, vec!["-".to_string()]);
        assert_eq!(config.revenue_per_conversion, DEFAULT_REVENUE_PER_CONVERSION);
        assert!(config.channel_aliases.is_empty());
    }

    #[test]
    fn vocabulary_includes_configured_aliases() {
        let config: CleanConfig =
            serde_yaml::from_str("channel_aliases:\n  linkdin: LinkedIn\nplaceholders: ['-']\n")
                .unwrap();
        let vocabulary = config.vocabulary().unwrap();
        assert_eq!(vocabulary.normalize_text("LINKDIN"), "LinkedIn");
        assert_eq!(vocabulary.normalize_text("-"), "Unknown");
        assert_eq!(vocabulary.normalize_text("facebok"), "Facebook");
    }

    #[test]
    fn conflicting_alias_is_an_error() {
        let config: CleanConfig =
            serde_yaml::from_str("channel_aliases:\n  gogle: Bing\n").unwrap();
        assert!(config.vocabulary().is_err());
    }
}
