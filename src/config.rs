//! Run configuration.
//!
//! Every threshold the engine uses is a named constant here with a matching
//! config field, so a TOML file can tune any of them.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::rules::RuleSpec;
use crate::source::SourceSpec;

pub const DEFAULT_PAGE_MARKER_TAG: &str = "OAB_pp.";
pub const DEFAULT_GARBLED_RATIO: f64 = 0.4;
pub const DEFAULT_GARBLED_MIN_LEN: usize = 5;
pub const DEFAULT_MAX_PAGE_NUMBER: u32 = 70;
pub const DEFAULT_RUNNING_HEADER_MIN_REPEATS: usize = 3;
pub const DEFAULT_MAX_WORD_SHRINKAGE_PCT: f64 = 5.0;
pub const DEFAULT_SAMPLE_SIZE: usize = 20;
pub const DEFAULT_CHAPTER_MARKER: &str = r"\[Chapter (\d+)\]";

/// Phrases every faithful rendering of the book contains.
pub const DEFAULT_KEY_PHRASES: &[&str] = &[
    "If you wish to free yourself from the sufferings of birth and death",
    "This truth is Myoho-renge-kyo",
    "Chanting Myoho-renge-kyo will therefore enable you to grasp the mystic truth",
    "Even though you chant and believe in Myoho-renge-kyo",
    "Arouse deep faith, and diligently polish your mirror day and night",
    "The Lotus Sutra is the king of sutras",
    "fundamental darkness",
    "attaining Buddhahood in this lifetime",
    "Nam-myoho-renge-kyo",
    "Nichiren Daishonin",
    "Soka Gakkai",
    "oneness of mentor and disciple",
    "human revolution",
    "mystic truth innate in all life",
];

/// Phrases whose loss during cleaning signals a damaged source.
pub const DEFAULT_REQUIRED_PHRASES: &[&str] = &[
    "Nam-myoho-renge-kyo",
    "Daisaku Ikeda",
    "Nichiren Daishonin",
    "attaining Buddhahood",
    "Table of Contents",
    "Index",
];

/// Top-level configuration for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub sources: Vec<SourceSpec>,
    pub corrections: CorrectionConfig,
    pub artifacts: ArtifactConfig,
    pub similarity: SimilarityConfig,
    pub segmentation: SegmenterConfig,
    pub verification: VerificationConfig,
    pub integrity: IntegrityConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Start from the built-in domain and generic tables.
    pub use_default_rules: bool,
    /// Upper bound on whole domain+generic passes.
    pub max_passes: usize,
    /// Extra domain rules, appended after the built-in ones.
    pub domain_rules: Vec<RuleSpec>,
    /// Extra generic rules, appended after the built-in ones.
    pub generic_rules: Vec<RuleSpec>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            use_default_rules: true,
            max_passes: crate::rules::CorrectionEngine::DEFAULT_MAX_PASSES,
            domain_rules: Vec::new(),
            generic_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Book-specific tag that starts every printer page marker.
    pub page_marker_tag: String,
    /// Lines whose alphanumeric-or-space share is below this are garbled.
    pub garbled_ratio: f64,
    /// Lines this short are never classified as garbled.
    pub garbled_min_len: usize,
    /// Largest bare number still read as a page number.
    pub max_page_number: u32,
    /// Exact running-header lines to remove.
    pub running_headers: Vec<String>,
    /// Repeats before an unlisted short line is flagged as a likely header.
    pub running_header_min_repeats: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            page_marker_tag: DEFAULT_PAGE_MARKER_TAG.to_string(),
            garbled_ratio: DEFAULT_GARBLED_RATIO,
            garbled_min_len: DEFAULT_GARBLED_MIN_LEN,
            max_page_number: DEFAULT_MAX_PAGE_NUMBER,
            running_headers: Vec::new(),
            running_header_min_repeats: DEFAULT_RUNNING_HEADER_MIN_REPEATS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Ignore very frequent characters as match seeds on long inputs.
    pub autojunk: bool,
    /// Maximum items kept in each diff sample.
    pub sample_size: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            autojunk: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Chapter marker; the first capture group is the chapter number.
    pub marker_pattern: String,
    /// Display titles keyed by chapter label (`front_matter`, `chapter_1`, ...).
    pub chapter_titles: IndexMap<String, String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        let titles = [
            ("front_matter", "Front Matter"),
            ("chapter_1", "Attaining Buddhahood in This Lifetime"),
            ("chapter_2", "The Significance of Chanting Nam-myoho-renge-kyo"),
            ("chapter_3", "If You Think the Law Is Outside Yourself"),
            ("chapter_4", "Transforming Our Fundamental Attitude"),
            ("chapter_5", "Chanting With a Brave and Vigorous Spirit"),
            ("chapter_6", "The Mystic Nature of Our Lives"),
            ("chapter_7", "Faith for Attaining Buddhahood in This Lifetime"),
        ];
        Self {
            marker_pattern: DEFAULT_CHAPTER_MARKER.to_string(),
            chapter_titles: titles
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub phrases: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            phrases: to_strings(DEFAULT_KEY_PHRASES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Largest tolerated word loss from raw to cleaned text, in percent.
    pub max_word_shrinkage_pct: f64,
    /// Phrases that must survive cleaning whenever the raw text has them.
    pub required_phrases: Vec<String>,
    /// Structural marker whose ordered occurrences must survive cleaning.
    pub marker_pattern: String,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            max_word_shrinkage_pct: DEFAULT_MAX_WORD_SHRINKAGE_PCT,
            required_phrases: to_strings(DEFAULT_REQUIRED_PHRASES),
            marker_pattern: DEFAULT_CHAPTER_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Also write one file per chapter under `chapters/`.
    pub write_chapters: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reconciled"),
            write_chapters: true,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ReconcileConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read and parse a TOML file. Relative source paths are resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReconcileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            for spec in &mut config.sources {
                if spec.path.is_relative() {
                    spec.path = base.join(&spec.path);
                }
            }
        }
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let corrections = &self.corrections;
        if corrections.max_passes == 0 {
            return Err(config_error("corrections.max_passes must be at least 1"));
        }
        for spec in corrections.domain_rules.iter().chain(&corrections.generic_rules) {
            spec.compile()?;
        }

        let artifacts = &self.artifacts;
        if !(0.0..=1.0).contains(&artifacts.garbled_ratio) {
            return Err(config_error("artifacts.garbled_ratio must be within [0, 1]"));
        }
        if artifacts.max_page_number == 0 {
            return Err(config_error("artifacts.max_page_number must be at least 1"));
        }
        if artifacts.running_header_min_repeats < 2 {
            return Err(config_error(
                "artifacts.running_header_min_repeats must be at least 2",
            ));
        }

        if self.similarity.sample_size == 0 {
            return Err(config_error("similarity.sample_size must be at least 1"));
        }

        let marker = Regex::new(&self.segmentation.marker_pattern)?;
        if marker.captures_len() < 2 {
            return Err(config_error(
                "segmentation.marker_pattern needs a capture group for the chapter number",
            ));
        }
        Regex::new(&self.integrity.marker_pattern)?;

        if !(0.0..=100.0).contains(&self.integrity.max_word_shrinkage_pct) {
            return Err(config_error(
                "integrity.max_word_shrinkage_pct must be within [0, 100]",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.sources {
            if spec.id.is_empty() {
                return Err(config_error("every source needs a non-empty id"));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(config_error(&format!("duplicate source id '{}'", spec.id)));
            }
        }
        Ok(())
    }
}

fn config_error(message: &str) -> ReconcileError {
    ReconcileError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReconcileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.artifacts.max_page_number, 70);
        assert_eq!(config.similarity.sample_size, 20);
        assert!(config.corrections.use_default_rules);
    }

    #[test]
    fn test_invalid_garbled_ratio() {
        let mut config = ReconcileConfig::default();
        config.artifacts.garbled_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_marker_needs_capture_group() {
        let mut config = ReconcileConfig::default();
        config.segmentation.marker_pattern = r"\[Chapter \d+\]".to_string();
        assert!(matches!(config.validate(), Err(ReconcileError::Config(_))));
    }

    #[test]
    fn test_bad_rule_pattern_fails_validation() {
        let mut config = ReconcileConfig::default();
        config.corrections.generic_rules.push(RuleSpec::new("(", "x"));
        assert!(matches!(config.validate(), Err(ReconcileError::Regex(_))));
    }

    #[test]
    fn test_duplicate_source_ids() {
        let mut config = ReconcileConfig::default();
        config.sources = vec![
            SourceSpec::new("ocr", "a.txt", 0),
            SourceSpec::new("ocr", "b.txt", 1),
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReconcileConfig::from_toml(
            r#"
            [[sources]]
            id = "transcript"
            path = "transcript.txt"
            priority = 0

            [artifacts]
            running_headers = ["ON ATTAINING BUDDHAHOOD"]

            [[corrections.domain_rules]]
            pattern = "Ikedda"
            replacement = "Ikeda"
            whole_word = true
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.artifacts.page_marker_tag, "OAB_pp.");
        assert_eq!(config.artifacts.running_headers.len(), 1);
        assert_eq!(config.corrections.domain_rules[0].replacement, "Ikeda");
        assert_eq!(config.verification.phrases.len(), DEFAULT_KEY_PHRASES.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ReconcileConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ReconcileConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
