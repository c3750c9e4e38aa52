//! Machine-readable run report.

use indexmap::IndexMap;
use serde::Serialize;

use crate::artifacts::ArtifactKind;
use crate::chapters::ChapterSummary;
use crate::error::{Issue, Result};
use crate::integrity::IntegrityReport;
use crate::review::SuspiciousWord;
use crate::selector::RankedSource;
use crate::similarity::PairScore;
use crate::verify::VerificationReport;

/// What cleaning did to one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub id: String,
    pub priority: u32,
    pub chars_before: usize,
    pub words_before: usize,
    pub chars_after: usize,
    pub words_after: usize,
    pub substitutions: u64,
    /// Substitutions per rule, in table order.
    pub rules_fired: IndexMap<String, u64>,
    pub correction_passes: usize,
    pub removed_artifacts: IndexMap<ArtifactKind, usize>,
    pub review_artifacts: IndexMap<ArtifactKind, usize>,
    pub integrity: IntegrityReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub primary: String,
    pub sources: Vec<SourceReport>,
    /// Non-primary candidates, most similar to the primary first.
    pub ranked: Vec<RankedSource>,
    pub similarity: Vec<PairScore>,
    pub chapters: Vec<ChapterSummary>,
    pub verification: VerificationReport,
    /// Which candidates contain each checklist phrase.
    pub cross_check: IndexMap<String, Vec<String>>,
    pub suspicious: Vec<SuspiciousWord>,
    pub review_patterns: IndexMap<String, u64>,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Issue counts by label, in first-seen order.
    pub fn issue_counts(&self) -> IndexMap<&'static str, usize> {
        let mut counts = IndexMap::new();
        for issue in &self.issues {
            *counts.entry(issue.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn source(&self, id: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.id == id)
    }
}
