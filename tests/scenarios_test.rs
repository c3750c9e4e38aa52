//! End-to-end checks of each stage on small, fully known inputs.

use rust_ocr_reconcile::config::{ArtifactConfig, SegmenterConfig};
use rust_ocr_reconcile::{
    ArtifactDetector, ArtifactKind, ChapterKey, ChapterSegmenter, CorrectionEngine, CorrectionRule, Disposition,
    Document, SimilarityScorer, apply_rules, verify,
};

#[test]
fn test_page_marker_removed_and_blank_lines_collapsed() {
    let detector = ArtifactDetector::new(ArtifactConfig::default()).unwrap();
    let doc = Document::new("ocr", 0, "OAB_pp.00i Page i\nHello\n\n\n\nWorld\n");

    let detection = detector.detect(&doc);

    assert_eq!(detection.document.content(), "Hello\n\nWorld");
    assert_eq!(detection.document.id(), "ocr");
    assert_eq!(doc.content(), "OAB_pp.00i Page i\nHello\n\n\n\nWorld\n");
    assert!(
        detection
            .spans
            .iter()
            .any(|s| s.kind == ArtifactKind::PageMarker && s.disposition == Disposition::Remove)
    );
}

#[test]
fn test_single_rule_table() {
    let rules = vec![CorrectionRule::new("Nichrn", "Nichiren").unwrap()];
    let (text, stats) = apply_rules("Nichrn Daishonin taught...", &rules);
    assert_eq!(text, "Nichiren Daishonin taught...");
    assert_eq!(stats.substitutions, 1);
}

#[test]
fn test_default_engine_on_domain_sentence() {
    let engine = CorrectionEngine::with_defaults();
    let correction = engine.correct(&Document::new("ocr", 1, "Nichrn Daishonin taught..."));
    assert_eq!(correction.document.content(), "Nichiren Daishonin taught...");
    assert!(correction.converged);
}

#[test]
fn test_chapter_segmentation() {
    let segmenter = ChapterSegmenter::new(&SegmenterConfig::default()).unwrap();
    let doc = Document::new("t", 0, "[Chapter 1]\nAlpha\n[Chapter 2]\nBeta");

    let chapters = segmenter.segment(&doc).by_key();

    let flat: Vec<(String, &str)> = chapters.iter().map(|(k, v)| (k.label(), v.as_str())).collect();
    assert_eq!(
        flat,
        vec![
            ("front_matter".to_string(), ""),
            ("chapter_1".to_string(), "Alpha"),
            ("chapter_2".to_string(), "Beta"),
        ]
    );
    assert_eq!(chapters.first().map(|(k, _)| *k), Some(ChapterKey::FrontMatter));
}

#[test]
fn test_similarity_scores() {
    let scorer = SimilarityScorer::default();

    let same = scorer.score("abc def", "abc def");
    assert_eq!(same.ratio, 1.0);
    assert_eq!(same.jaccard, 1.0);

    let partial = scorer.score("abc def", "abc xyz");
    assert!((partial.jaccard - 1.0 / 3.0).abs() < 1e-12);
    assert!(partial.ratio > 0.0 && partial.ratio < 1.0);
}

#[test]
fn test_phrase_verification_is_case_insensitive() {
    let report = verify("Hello world", &["hello".to_string()]);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results.get("hello"), Some(&true));
}
