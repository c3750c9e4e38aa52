//! Reconciles several noisy renderings of one book (OCR output, transcripts,
//! PDF text extraction) into a single canonical text.
//!
//! The stages are plain values wired together by [`Pipeline`]: a
//! [`CorrectionEngine`] repairs known misreadings, an [`ArtifactDetector`]
//! strips scanner noise, a [`SimilarityScorer`] compares candidates,
//! [`select_primary`] picks the most trusted one, a [`ChapterSegmenter`]
//! splits it and [`verify()`] checks it against a phrase checklist.
//!
//! ```no_run
//! use rust_ocr_reconcile::{Pipeline, ReconcileConfig, write_outputs};
//!
//! let config = ReconcileConfig::load("reconcile.toml")?;
//! let out_dir = config.output.dir.clone();
//! let output = Pipeline::new(config)?.run_from_config()?;
//! write_outputs(&output, &out_dir, true)?;
//! # Ok::<(), rust_ocr_reconcile::ReconcileError>(())
//! ```

pub mod artifacts;
pub mod chapters;
pub mod config;
pub mod document;
pub mod error;
pub mod integrity;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod review;
pub mod rules;
pub mod selector;
pub mod similarity;
pub mod source;
pub mod tables;
pub mod verify;

#[cfg(feature = "python")]
mod python;

pub use artifacts::{ArtifactDetector, ArtifactKind, ArtifactSpan, Detection, Disposition, LineClass};
pub use chapters::{Chapter, ChapterKey, ChapterSegmenter, Segmentation};
pub use config::ReconcileConfig;
pub use document::Document;
pub use error::{Issue, ReconcileError, Result};
pub use integrity::{IntegrityIssue, IntegrityReport, check_integrity};
pub use output::write_outputs;
pub use pipeline::{Pipeline, PipelineOutput};
pub use report::Report;
pub use rules::{CorrectionEngine, CorrectionRule, RuleSpec, apply_rules};
pub use selector::{Selection, select_primary};
pub use similarity::{SimilarityResult, SimilarityScorer};
pub use source::{SourceSpec, load_sources};
pub use verify::{VerificationReport, cross_check, verify};
