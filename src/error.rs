//! Error types and non-fatal issue records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::integrity::IntegrityIssue;

/// Fatal errors raised by the reconciliation engine.
///
/// Everything the engine can recover from is reported as an [`Issue`]
/// instead; only missing input and output failures surface here.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declared candidate could not be read.
    #[error("source '{id}' unavailable at '{path}': {source}")]
    SourceUnavailable {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No candidate survived loading and cleaning.
    #[error("no viable source among {attempted} candidate(s)")]
    NoViableSource { attempted: usize },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// A non-fatal anomaly found during a run. Every issue ends up in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A candidate could not be loaded and was skipped.
    SourceUnavailable { source_id: String, reason: String },
    /// Cleaning changed something it should not have.
    IntegrityRegression {
        source_id: String,
        detail: IntegrityIssue,
    },
    /// A required phrase is absent from the canonical text.
    VerificationFailure { phrase: String },
    /// Correction was still changing text when the pass limit was reached.
    CorrectionNotConverged { source_id: String, passes: usize },
    /// A candidate was empty after cleaning and could not be selected.
    EmptySource { source_id: String },
}

impl Issue {
    /// Short machine-readable label, used for summary counts.
    pub fn label(&self) -> &'static str {
        match self {
            Issue::SourceUnavailable { .. } => "source_unavailable",
            Issue::IntegrityRegression { .. } => "integrity_regression",
            Issue::VerificationFailure { .. } => "verification_failure",
            Issue::CorrectionNotConverged { .. } => "correction_not_converged",
            Issue::EmptySource { .. } => "empty_source",
        }
    }
}
