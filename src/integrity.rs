//! Raw-versus-cleaned integrity check.
//!
//! Cleaning is allowed to remove noise, never content. This compares a raw
//! candidate with its cleaned counterpart and reports anything that looks
//! like lost content. Findings are signals for manual review; nothing is
//! reverted.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::IntegrityConfig;
use crate::document::word_count;
use crate::error::Result;

/// One way cleaning damaged a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// The ordered sequence of structural markers changed.
    MarkerMismatch { before: Vec<String>, after: Vec<String> },
    /// A required phrase present in the raw text is gone.
    MissingPhrase { phrase: String },
    /// More words disappeared than the configured threshold allows.
    WordShrinkage { percent: f64, threshold: f64 },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::MarkerMismatch { before, after } => write!(
                f,
                "chapter marker mismatch: {} before, {} after",
                before.len(),
                after.len()
            ),
            IntegrityIssue::MissingPhrase { phrase } => {
                write!(f, "missing key phrase '{phrase}'")
            }
            IntegrityIssue::WordShrinkage { percent, threshold } => {
                write!(f, "high word removal: {percent:.1}% (limit {threshold:.1}%)")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityStats {
    pub original_words: usize,
    pub cleaned_words: usize,
    /// Negative when cleaning added words (e.g. by splitting run-ons).
    pub words_removed: i64,
    pub percent_removed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub stats: IntegrityStats,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Compiled form of [`IntegrityConfig`].
#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    marker: Regex,
    required_phrases: Vec<String>,
    max_shrinkage_pct: f64,
}

impl IntegrityChecker {
    pub fn new(config: &IntegrityConfig) -> Result<Self> {
        Ok(Self {
            marker: Regex::new(&config.marker_pattern)?,
            required_phrases: config.required_phrases.clone(),
            max_shrinkage_pct: config.max_word_shrinkage_pct,
        })
    }

    pub fn check(&self, raw: &str, cleaned: &str) -> IntegrityReport {
        let mut issues = Vec::new();

        let before = self.markers(raw);
        let after = self.markers(cleaned);
        if before != after {
            issues.push(IntegrityIssue::MarkerMismatch { before, after });
        }

        let raw_lower = raw.to_lowercase();
        let cleaned_lower = cleaned.to_lowercase();
        for phrase in &self.required_phrases {
            let needle = phrase.to_lowercase();
            if raw_lower.contains(&needle) && !cleaned_lower.contains(&needle) {
                issues.push(IntegrityIssue::MissingPhrase {
                    phrase: phrase.clone(),
                });
            }
        }

        let original_words = word_count(raw);
        let cleaned_words = word_count(cleaned);
        let words_removed = original_words as i64 - cleaned_words as i64;
        let percent_removed = if original_words == 0 {
            0.0
        } else {
            words_removed as f64 / original_words as f64 * 100.0
        };
        if percent_removed > self.max_shrinkage_pct {
            issues.push(IntegrityIssue::WordShrinkage {
                percent: percent_removed,
                threshold: self.max_shrinkage_pct,
            });
        }

        for issue in &issues {
            warn!(%issue, "integrity check failed");
        }

        IntegrityReport {
            stats: IntegrityStats {
                original_words,
                cleaned_words,
                words_removed,
                percent_removed,
            },
            issues,
        }
    }

    fn markers(&self, text: &str) -> Vec<String> {
        self.marker
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// One-shot check with the given configuration.
pub fn check_integrity(raw: &str, cleaned: &str, config: &IntegrityConfig) -> Result<IntegrityReport> {
    Ok(IntegrityChecker::new(config)?.check(raw, cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IntegrityConfig {
        IntegrityConfig {
            required_phrases: vec!["Nichiren Daishonin".to_string()],
            ..IntegrityConfig::default()
        }
    }

    #[test]
    fn test_clean_pass() {
        let raw = "[Chapter 1]\nNichiren  Daishonin taught\n[Chapter 2]\nmore";
        let cleaned = "[Chapter 1]\nNichiren Daishonin taught\n[Chapter 2]\nmore";
        let report = check_integrity(raw, cleaned, &config()).unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.stats.words_removed, 0);
    }

    #[test]
    fn test_marker_mismatch() {
        let raw = "[Chapter 1]\nAlpha\n[Chapter 2]\nBeta";
        let cleaned = "[Chapter 1]\nAlpha\nBeta";
        let report = check_integrity(raw, cleaned, &config()).unwrap();
        assert!(matches!(
            &report.issues[0],
            IntegrityIssue::MarkerMismatch { before, after } if before.len() == 2 && after.len() == 1
        ));
    }

    #[test]
    fn test_missing_phrase_only_when_raw_had_it() {
        let report = check_integrity("nichiren daishonin", "nichiren", &config()).unwrap();
        assert!(report
            .issues
            .contains(&IntegrityIssue::MissingPhrase { phrase: "Nichiren Daishonin".to_string() }));

        let report = check_integrity("nothing here", "nothing", &config()).unwrap();
        assert!(!report
            .issues
            .iter()
            .any(|i| matches!(i, IntegrityIssue::MissingPhrase { .. })));
    }

    #[test]
    fn test_word_shrinkage_threshold() {
        let raw = "one two three four five six seven eight nine ten";
        let report = check_integrity(raw, "one two three four five six seven eight nine", &config()).unwrap();
        assert_eq!(report.stats.words_removed, 1);
        assert!(matches!(
            report.issues[0],
            IntegrityIssue::WordShrinkage { percent, .. } if (percent - 10.0).abs() < 1e-9
        ));

        let raw: String = (0..100).map(|i| format!("w{i} ")).collect();
        let cleaned: String = (0..96).map(|i| format!("w{i} ")).collect();
        assert!(check_integrity(&raw, &cleaned, &config()).unwrap().is_clean());
    }

    #[test]
    fn test_empty_raw_text() {
        let report = check_integrity("", "", &config()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.stats.percent_removed, 0.0);
    }
}
