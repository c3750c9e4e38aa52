//! End-to-end reconciliation run.
//!
//! Per candidate: correct, strip artifacts, check integrity. Then score the
//! cleaned candidates against each other, pick the primary, segment it and
//! verify it. Every stage is pure; the only fatal outcome is having no
//! usable candidate.

use indexmap::IndexMap;
use tracing::info;

use crate::artifacts::ArtifactDetector;
use crate::chapters::{ChapterSegmenter, Segmentation, render_chapter_file};
use crate::config::ReconcileConfig;
use crate::document::Document;
use crate::error::{Issue, ReconcileError, Result};
use crate::integrity::IntegrityChecker;
use crate::report::{Report, SourceReport};
use crate::review::{count_review_patterns, scan_suspicious};
use crate::rules::CorrectionEngine;
use crate::selector::select_primary;
use crate::similarity::SimilarityScorer;
use crate::source::load_sources;
use crate::verify::{cross_check, verify};

/// Context window around each suspicious token.
const SUSPICIOUS_CONTEXT_CHARS: usize = 40;
/// Distinct suspicious tokens kept in the report.
const SUSPICIOUS_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub canonical: Document,
    pub segmentation: Segmentation,
    /// Every candidate after correction and artifact removal.
    pub cleaned: Vec<Document>,
    pub report: Report,
    chapter_titles: IndexMap<String, String>,
}

impl PipelineOutput {
    /// `(file name, contents)` for every chapter, bannered with its title.
    pub fn chapter_files(&self) -> Vec<(String, String)> {
        self.segmentation
            .by_key()
            .iter()
            .map(|(key, body)| {
                let label = key.label();
                let title = self.chapter_titles.get(&label).unwrap_or(&label);
                (key.file_name(), render_chapter_file(title, body))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ReconcileConfig,
    engine: CorrectionEngine,
    detector: ArtifactDetector,
    scorer: SimilarityScorer,
    segmenter: ChapterSegmenter,
    integrity: IntegrityChecker,
}

impl Pipeline {
    /// Validate the configuration and compile every stage.
    pub fn new(config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: CorrectionEngine::from_config(&config.corrections)?,
            detector: ArtifactDetector::new(config.artifacts.clone())?,
            scorer: SimilarityScorer::new(config.similarity.clone()),
            segmenter: ChapterSegmenter::new(&config.segmentation)?,
            integrity: IntegrityChecker::new(&config.integrity)?,
            config,
        })
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile already-loaded candidates.
    pub fn run(&self, sources: Vec<Document>) -> Result<PipelineOutput> {
        let attempted = sources.len();
        self.reconcile(sources, Vec::new(), attempted)
    }

    /// Load `config.sources` and reconcile them. Unreadable sources are
    /// skipped and reported.
    pub fn run_from_config(&self) -> Result<PipelineOutput> {
        let (sources, issues) = load_sources(&self.config.sources);
        self.reconcile(sources, issues, self.config.sources.len())
    }

    fn reconcile(&self, sources: Vec<Document>, mut issues: Vec<Issue>, attempted: usize) -> Result<PipelineOutput> {
        info!(sources = sources.len(), "starting reconciliation");

        let mut cleaned = Vec::with_capacity(sources.len());
        let mut source_reports = Vec::with_capacity(sources.len());

        for raw in &sources {
            let correction = self.engine.correct(raw);
            if !correction.converged {
                issues.push(Issue::CorrectionNotConverged {
                    source_id: raw.id().to_string(),
                    passes: correction.passes,
                });
            }

            let detection = self.detector.detect(&correction.document);
            let integrity = self.integrity.check(raw.content(), detection.document.content());
            for detail in &integrity.issues {
                issues.push(Issue::IntegrityRegression {
                    source_id: raw.id().to_string(),
                    detail: detail.clone(),
                });
            }

            source_reports.push(SourceReport {
                id: raw.id().to_string(),
                priority: raw.priority(),
                chars_before: raw.char_count(),
                words_before: raw.word_count(),
                chars_after: detection.document.char_count(),
                words_after: detection.document.word_count(),
                substitutions: correction.stats.substitutions,
                rules_fired: correction.stats.by_rule,
                correction_passes: correction.passes,
                removed_artifacts: detection.removed_by_kind(),
                review_artifacts: detection.review_by_kind(),
                integrity,
            });
            cleaned.push(detection.document);
        }

        let similarity = self.scorer.similarity_matrix(&cleaned);

        let selection = select_primary(&cleaned, &self.scorer).map_err(|err| match err {
            ReconcileError::NoViableSource { .. } => ReconcileError::NoViableSource { attempted },
            other => other,
        })?;
        issues.extend(selection.issues());

        let primary = &selection.primary;
        let segmentation = self.segmenter.segment(primary);

        let phrases = &self.config.verification.phrases;
        let verification = verify(primary.content(), phrases);
        issues.extend(verification.issues());

        let report = Report {
            primary: primary.id().to_string(),
            sources: source_reports,
            ranked: selection.ranked.clone(),
            similarity,
            chapters: segmentation.summaries(),
            verification,
            cross_check: cross_check(phrases, &cleaned),
            suspicious: scan_suspicious(primary.content(), SUSPICIOUS_CONTEXT_CHARS, SUSPICIOUS_LIMIT),
            review_patterns: count_review_patterns(primary.content()),
            issues,
        };

        info!(
            primary = %report.primary,
            chapters = report.chapters.len(),
            issues = report.issues.len(),
            "reconciliation finished"
        );

        Ok(PipelineOutput {
            canonical: selection.primary,
            segmentation,
            cleaned,
            report,
            chapter_titles: self.config.segmentation.chapter_titles.clone(),
        })
    }
}
