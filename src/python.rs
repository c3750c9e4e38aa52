//! Python extension module, built with the `python` feature.

use std::collections::HashMap;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::artifacts::ArtifactDetector;
use crate::chapters::ChapterSegmenter;
use crate::config::{ArtifactConfig, ReconcileConfig, SegmenterConfig};
use crate::document::Document;
use crate::error::ReconcileError;
use crate::output::write_outputs;
use crate::pipeline::Pipeline;
use crate::review::{self, count_review_patterns};
use crate::rules::CorrectionEngine;
use crate::similarity::SimilarityScorer;
use crate::verify::verify;

fn to_py_err(err: ReconcileError) -> PyErr {
    match err {
        ReconcileError::Io { .. } | ReconcileError::SourceUnavailable { .. } => {
            PyIOError::new_err(err.to_string())
        }
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Apply the built-in correction tables.
/// Returns: (corrected_text, substitution_count)
#[pyfunction]
fn clean_text(text: String) -> PyResult<(String, u64)> {
    Ok(CorrectionEngine::with_defaults().correct_text(&text))
}

/// Remove page markers, garbled lines and page-break numbers
#[pyfunction]
fn strip_artifacts(text: String) -> PyResult<String> {
    let detector = ArtifactDetector::new(ArtifactConfig::default()).map_err(to_py_err)?;
    Ok(detector.strip(&text))
}

/// Returns: (ratio, jaccard)
#[pyfunction]
fn score_texts(a: String, b: String) -> PyResult<(f64, f64)> {
    let result = SimilarityScorer::default().score(&a, &b);
    Ok((result.ratio, result.jaccard))
}

/// Returns: list of (chapter_key, body), front matter first
#[pyfunction]
fn split_chapters(text: String) -> PyResult<Vec<(String, String)>> {
    let segmenter = ChapterSegmenter::new(&SegmenterConfig::default()).map_err(to_py_err)?;
    let segmentation = segmenter.segment(&Document::new("text", 0, text));
    Ok(segmentation
        .by_key()
        .into_iter()
        .map(|(key, body)| (key.label(), body))
        .collect())
}

/// Returns: list of (phrase, found) in input order
#[pyfunction]
fn verify_phrases(text: String, phrases: Vec<String>) -> PyResult<Vec<(String, bool)>> {
    Ok(verify(&text, &phrases).results.into_iter().collect())
}

/// Count patterns that are flagged for a human rather than auto-corrected
#[pyfunction]
fn review_patterns(text: String) -> PyResult<HashMap<String, u64>> {
    Ok(count_review_patterns(&text).into_iter().collect())
}

/// Suspicious token returned to Python
#[pyclass(name = "SuspiciousWord")]
#[derive(Clone)]
struct PySuspiciousWord {
    #[pyo3(get)]
    word: String,
    #[pyo3(get)]
    reason: String,
    #[pyo3(get)]
    count: u64,
    #[pyo3(get)]
    context: String,
}

#[pyfunction]
#[pyo3(signature = (text, context_chars = 40, limit = 100))]
fn scan_suspicious(text: String, context_chars: usize, limit: usize) -> PyResult<Vec<PySuspiciousWord>> {
    Ok(review::scan_suspicious(&text, context_chars, limit)
        .into_iter()
        .map(|w| PySuspiciousWord {
            word: w.word,
            reason: w.reason,
            count: w.count,
            context: w.context,
        })
        .collect())
}

/// Run the full pipeline from a TOML config file and write its outputs
/// Returns: the JSON report
#[pyfunction]
fn reconcile_files(config_path: String) -> PyResult<String> {
    let config = ReconcileConfig::load(&config_path).map_err(to_py_err)?;
    let output_config = config.output.clone();
    let pipeline = Pipeline::new(config).map_err(to_py_err)?;
    let output = pipeline.run_from_config().map_err(to_py_err)?;
    write_outputs(&output, &output_config.dir, output_config.write_chapters).map_err(to_py_err)?;
    output.report.to_json().map_err(to_py_err)
}

#[pymodule]
fn rust_ocr_reconcile(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(clean_text, m)?)?;
    m.add_function(wrap_pyfunction!(strip_artifacts, m)?)?;
    m.add_function(wrap_pyfunction!(score_texts, m)?)?;
    m.add_function(wrap_pyfunction!(split_chapters, m)?)?;
    m.add_function(wrap_pyfunction!(verify_phrases, m)?)?;
    m.add_function(wrap_pyfunction!(review_patterns, m)?)?;
    m.add_function(wrap_pyfunction!(scan_suspicious, m)?)?;
    m.add_function(wrap_pyfunction!(reconcile_files, m)?)?;
    m.add_class::<PySuspiciousWord>()?;
    Ok(())
}
