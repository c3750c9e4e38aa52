//! Scanner and printer artifact detection.
//!
//! Lines are classified one at a time by small named predicates, then the
//! page-number heuristic runs over the whole line sequence because it depends
//! on what surrounds a number. Removal happens in a fixed order so that the
//! cleaned output is already stable: running the detector on its own output
//! removes nothing further.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ArtifactConfig;
use crate::document::Document;
use crate::error::Result;

/// Longest line still considered a candidate running header.
const MAX_HEADER_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    PageMarker,
    RunningHeader,
    StandalonePageNumber,
    GarbledSymbols,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::PageMarker => "page_marker",
            ArtifactKind::RunningHeader => "running_header",
            ArtifactKind::StandalonePageNumber => "standalone_page_number",
            ArtifactKind::GarbledSymbols => "garbled_symbols",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Excised from the cleaned document.
    Remove,
    /// Kept, but worth a human look.
    Review,
}

/// A region of the input classified as non-content.
///
/// Line indices are 0-based and inclusive, counted in the input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub kind: ArtifactKind,
    pub disposition: Disposition,
    /// The flagged text; for embedded page markers only the marker itself.
    pub text: String,
}

impl ArtifactSpan {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// How a single line reads in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Content,
    PageMarker,
    RunningHeader,
    /// A bare number in page range; whether it goes depends on its neighbours.
    PageNumber(u32),
    Garbled,
}

/// Share of characters that are alphanumeric or whitespace. Empty lines score 1.
pub fn garbled_ratio(line: &str) -> f64 {
    let total = line.chars().count();
    if total == 0 {
        return 1.0;
    }
    let word_chars = line
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .count();
    word_chars as f64 / total as f64
}

/// True for symbol-heavy lines: longer than `min_len` chars and below `threshold`.
pub fn is_garbled(line: &str, threshold: f64, min_len: usize) -> bool {
    let line = line.trim();
    line.chars().count() > min_len && garbled_ratio(line) < threshold
}

/// The page number a line consists of, if it is a bare number in `1..=max`.
pub fn page_number_value(line: &str, max: u32) -> Option<u32> {
    let line = line.trim();
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse::<u32>()
        .ok()
        .filter(|n| (1..=max).contains(n))
}

/// Cleaned document plus every span found.
#[derive(Debug, Clone)]
pub struct Detection {
    pub document: Document,
    pub spans: Vec<ArtifactSpan>,
}

impl Detection {
    /// Removed lines per kind.
    pub fn removed_by_kind(&self) -> IndexMap<ArtifactKind, usize> {
        self.count_by_kind(Disposition::Remove)
    }

    /// Lines flagged for review per kind.
    pub fn review_by_kind(&self) -> IndexMap<ArtifactKind, usize> {
        self.count_by_kind(Disposition::Review)
    }

    fn count_by_kind(&self, disposition: Disposition) -> IndexMap<ArtifactKind, usize> {
        let mut counts = IndexMap::new();
        for span in self.spans.iter().filter(|s| s.disposition == disposition) {
            *counts.entry(span.kind).or_insert(0) += span.line_count();
        }
        counts.sort_keys();
        counts
    }
}

/// A line that survived the per-line pass, tagged with its input index.
struct Kept {
    index: usize,
    text: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactDetector {
    config: ArtifactConfig,
    full_marker: Regex,
    embedded_marker: Regex,
    page_boundary: Regex,
}

impl ArtifactDetector {
    pub fn new(config: ArtifactConfig) -> Result<Self> {
        let tag = regex::escape(&config.page_marker_tag);
        Ok(Self {
            full_marker: Regex::new(&format!(r"^{tag}.+Page \w+$"))?,
            embedded_marker: Regex::new(&format!(r"[ \t]*{tag}.+Page \w+"))?,
            page_boundary: Regex::new(r"^-{3}\s*PAGE\s+\w+\s*-{3}$")?,
            config,
        })
    }

    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    /// Classify one line without looking at its neighbours.
    pub fn classify_line(&self, line: &str) -> LineClass {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineClass::Blank;
        }
        if self.full_marker.is_match(trimmed) || self.page_boundary.is_match(trimmed) {
            return LineClass::PageMarker;
        }
        if self.config.running_headers.iter().any(|h| h.trim() == trimmed) {
            return LineClass::RunningHeader;
        }
        if let Some(n) = page_number_value(trimmed, self.config.max_page_number) {
            return LineClass::PageNumber(n);
        }
        if is_garbled(trimmed, self.config.garbled_ratio, self.config.garbled_min_len) {
            return LineClass::Garbled;
        }
        LineClass::Content
    }

    /// Find artifacts and return the document with `remove` spans excised.
    pub fn detect(&self, document: &Document) -> Detection {
        let mut spans = Vec::new();

        // Per-line removals
        let mut kept = Vec::new();
        for (index, raw) in document.content().split('\n').enumerate() {
            let mut line = raw.trim_end().to_string();
            if self.embedded_marker.is_match(&line) && self.classify_line(&line) != LineClass::PageMarker {
                for m in self.embedded_marker.find_iter(&line) {
                    push_span(&mut spans, index, ArtifactKind::PageMarker, Disposition::Remove, m.as_str().trim());
                }
                line = self.embedded_marker.replace_all(&line, "").trim_end().to_string();
            }

            let kind = match self.classify_line(&line) {
                LineClass::PageMarker => Some(ArtifactKind::PageMarker),
                LineClass::RunningHeader => Some(ArtifactKind::RunningHeader),
                LineClass::Garbled => Some(ArtifactKind::GarbledSymbols),
                _ => None,
            };
            match kind {
                Some(kind) => push_span(&mut spans, index, kind, Disposition::Remove, &line),
                None => kept.push(Kept { index, text: line }),
            }
        }

        let kept = collapse_blank_runs(kept);
        let kept = self.strip_page_numbers(kept, &mut spans);
        self.flag_repeated_lines(&kept, &mut spans);

        spans.sort_by_key(|s| (s.start_line, s.kind));

        let cleaned = kept
            .iter()
            .map(|k| k.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let cleaned = cleaned.trim().to_string();

        debug!(
            source = document.id(),
            spans = spans.len(),
            removed_chars = document.char_count().saturating_sub(cleaned.chars().count()),
            "artifact detection finished"
        );

        Detection {
            document: document.derive(cleaned),
            spans,
        }
    }

    /// Convenience wrapper returning only the cleaned text.
    pub fn strip(&self, text: &str) -> String {
        self.detect(&Document::new("", 0, text)).document.content().to_string()
    }

    /// Remove page numbers that sit alone between blank lines right before a
    /// capitalized word or a bracketed marker. Other bare numbers are kept
    /// and flagged.
    ///
    /// The scan runs backwards and looks at what will actually follow each
    /// number in the output, so a run of numbers before a heading goes in one
    /// pass. A numbered list item standing alone between blank lines before a
    /// capitalized paragraph is indistinguishable from a page number and is
    /// removed too.
    fn strip_page_numbers(&self, kept: Vec<Kept>, spans: &mut Vec<ArtifactSpan>) -> Vec<Kept> {
        let blank: Vec<bool> = kept.iter().map(|k| k.text.is_empty()).collect();
        let first_content = blank.iter().position(|b| !b);
        let mut out: Vec<Kept> = Vec::with_capacity(kept.len());

        for (pos, line) in kept.into_iter().enumerate().rev() {
            if page_number_value(&line.text, self.config.max_page_number).is_none() {
                out.push(line);
                continue;
            }

            // `out` is reversed: its last element is the next emitted line.
            let blank_after = out.last().is_some_and(|k| k.text.is_empty());
            let heading_next = out.len() >= 2
                && out[out.len() - 2]
                    .text
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase() || c == '[');
            // Preceded by a blank line that is not leading padding
            let blank_before =
                pos >= 1 && blank[pos - 1] && first_content.is_some_and(|first| first < pos - 1);

            if blank_before && blank_after && heading_next {
                push_span(spans, line.index, ArtifactKind::StandalonePageNumber, Disposition::Remove, &line.text);
                out.pop();
            } else {
                push_span(spans, line.index, ArtifactKind::StandalonePageNumber, Disposition::Review, &line.text);
                out.push(line);
            }
        }

        out.reverse();
        out
    }

    /// Flag short lines that repeat often enough to look like running titles.
    fn flag_repeated_lines(&self, kept: &[Kept], spans: &mut Vec<ArtifactSpan>) {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in kept {
            if looks_like_header(&line.text) {
                *counts.entry(line.text.trim()).or_insert(0) += 1;
            }
        }
        for line in kept {
            let text = line.text.trim();
            if counts.get(text).is_some_and(|&n| n >= self.config.running_header_min_repeats) {
                push_span(spans, line.index, ArtifactKind::RunningHeader, Disposition::Review, text);
            }
        }
    }
}


/// Record a span, extending the previous one when it covers the line right
/// before with the same kind and disposition.
fn push_span(
    spans: &mut Vec<ArtifactSpan>,
    line: usize,
    kind: ArtifactKind,
    disposition: Disposition,
    text: &str,
) {
    if let Some(last) = spans.last_mut() {
        if last.kind == kind && last.disposition == disposition && last.end_line + 1 == line {
            last.end_line = line;
            last.text.push('\n');
            last.text.push_str(text);
            return;
        }
    }
    spans.push(ArtifactSpan {
        start_line: line,
        end_line: line,
        kind,
        disposition,
        text: text.to_string(),
    });
}

/// Two or more blank lines in a row become one.
fn collapse_blank_runs(lines: Vec<Kept>) -> Vec<Kept> {
    let mut out: Vec<Kept> = Vec::with_capacity(lines.len());
    for line in lines {
        let repeat_blank = line.text.is_empty() && out.last().is_some_and(|k| k.text.is_empty());
        if !repeat_blank {
            out.push(line);
        }
    }
    out
}

fn looks_like_header(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line.chars().count() <= MAX_HEADER_LEN
        && line.chars().any(char::is_alphabetic)
        && !line.ends_with(['.', '?', '!', ',', ';', ':'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ArtifactDetector {
        ArtifactDetector::new(ArtifactConfig::default()).unwrap()
    }

    #[test]
    fn test_page_marker_and_blank_collapse() {
        let doc = Document::new("ocr", 0, "OAB_pp.00i Page i\nHello\n\n\n\nWorld\n");
        let detection = detector().detect(&doc);

        assert_eq!(detection.document.content(), "Hello\n\nWorld");
        assert_eq!(detection.spans.len(), 1);
        assert_eq!(detection.spans[0].kind, ArtifactKind::PageMarker);
        assert_eq!(detection.spans[0].start_line, 0);
        assert_eq!(detection.spans[0].disposition, Disposition::Remove);
    }

    #[test]
    fn test_embedded_marker_keeps_surrounding_text() {
        let text = "the mystic truth OAB_pp.001-050.indd 12 Page 12 innate in all life";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), "the mystic truth innate in all life");
        assert_eq!(detection.spans[0].text, "OAB_pp.001-050.indd 12 Page 12");
    }

    #[test]
    fn test_page_boundary_annotation() {
        let text = "--- PAGE 3 ---\nAlpha\n--- PAGE 4 ---\nBeta";
        assert_eq!(detector().strip(text), "Alpha\nBeta");
    }

    #[test]
    fn test_garbled_predicates() {
        assert!(is_garbled("#$%^&*(@!", 0.4, 5));
        assert!(!is_garbled("#$%^&", 0.4, 5), "too short to judge");
        assert!(!is_garbled("plain words, mostly", 0.4, 5));
        assert_eq!(garbled_ratio(""), 1.0);
        assert!((garbled_ratio("ab!!") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_garbled_line_dropped() {
        let text = "Alpha\n~~**##@@!!\nBeta";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), "Alpha\nBeta");
        assert_eq!(detection.removed_by_kind()[&ArtifactKind::GarbledSymbols], 1);
    }

    #[test]
    fn test_page_number_value_range() {
        assert_eq!(page_number_value(" 12 ", 70), Some(12));
        assert_eq!(page_number_value("0", 70), None);
        assert_eq!(page_number_value("71", 70), None);
        assert_eq!(page_number_value("1a", 70), None);
        assert_eq!(page_number_value("99999999999", 70), None);
    }

    #[test]
    fn test_page_number_before_heading_removed() {
        let text = "end of page.\n\n12\n\nThe next page";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), "end of page.\n\nThe next page");
        assert_eq!(detection.spans[0].kind, ArtifactKind::StandalonePageNumber);
        assert_eq!(detection.spans[0].disposition, Disposition::Remove);
        assert_eq!(detection.spans[0].start_line, 2);
    }

    #[test]
    fn test_page_number_before_lowercase_kept_for_review() {
        let text = "a sentence that\n\n12\n\ncontinues here";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), text);
        assert_eq!(detection.review_by_kind()[&ArtifactKind::StandalonePageNumber], 1);
    }

    #[test]
    fn test_consecutive_page_numbers_go_in_one_pass() {
        let text = "Alpha\n\n5\n\n6\n\n[Chapter 2]\nBeta";
        let detector = detector();
        let once = detector.strip(text);
        assert_eq!(once, "Alpha\n\n[Chapter 2]\nBeta");
        assert_eq!(detector.strip(&once), once);
    }

    #[test]
    fn test_leading_number_is_not_a_page_break() {
        let text = "3\n\nThree jewels";
        assert_eq!(detector().strip(text), text);
    }

    #[test]
    fn test_configured_running_header_removed() {
        let config = ArtifactConfig {
            running_headers: vec!["ON ATTAINING BUDDHAHOOD".to_string()],
            ..ArtifactConfig::default()
        };
        let detector = ArtifactDetector::new(config).unwrap();
        let text = "ON ATTAINING BUDDHAHOOD\nAlpha\n  ON ATTAINING BUDDHAHOOD  \nBeta";
        let detection = detector.detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), "Alpha\nBeta");
        assert_eq!(detection.removed_by_kind()[&ArtifactKind::RunningHeader], 2);
    }

    #[test]
    fn test_repeated_short_line_flagged_not_removed() {
        let text = "Lectures\nOne.\nLectures\nTwo.\nLectures\nThree.";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.document.content(), text);
        assert_eq!(detection.review_by_kind()[&ArtifactKind::RunningHeader], 3);
        assert!(detection.removed_by_kind().is_empty());
    }

    #[test]
    fn test_adjacent_spans_merge() {
        let text = "OAB_pp.1 Page 1\nOAB_pp.2 Page 2\nBody";
        let detection = detector().detect(&Document::new("ocr", 0, text));
        assert_eq!(detection.spans.len(), 1);
        assert_eq!(detection.spans[0].end_line, 1);
        assert_eq!(detection.spans[0].line_count(), 2);
    }

    #[test]
    fn test_trailing_spaces_removed() {
        assert_eq!(detector().strip("Alpha   \nBeta\t\n"), "Alpha\nBeta");
    }

    #[test]
    fn test_no_artifacts_yields_no_spans() {
        let detection = detector().detect(&Document::new("t", 0, "Plain prose only."));
        assert!(detection.spans.is_empty());
        assert_eq!(detection.document.content(), "Plain prose only.");
    }
}
