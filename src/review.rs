//! Diagnostics for manual review.
//!
//! Nothing here changes text. Suspicious tokens and context-dependent
//! misreadings are counted and sampled so a reader knows where to look.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Whitespace-delimited tokens; punctuation is trimmed from the edges later
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();

    // Shapes that real words rarely have
    // No backreferences in `regex`: tripled letters are listed out
    static ref SUSPICIOUS_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"[a-z][A-Z]").unwrap(), "mixed_case"),
        (Regex::new(r"[A-Za-z][0-9]|[0-9][A-Za-z]").unwrap(), "digit_in_word"),
        (Regex::new(r"(?i)(aaa|bbb|ccc|ddd|eee|fff|ggg|hhh|iii|jjj|kkk|lll|mmm|nnn|ooo|ppp|qqq|rrr|sss|ttt|uuu|vvv|www|xxx|yyy|zzz)").unwrap(), "triple_repeat"),
        (Regex::new(r"[A-Za-z][^\w\s'’.\-][A-Za-z]").unwrap(), "stray_symbol"),
    ];

    // Misreadings that depend on context; counted, never rewritten
    static ref REVIEW_PATTERNS: Vec<(&'static str, Regex, &'static str)> = vec![
        // Audio transcripts render "Nichiren" as "Nietzsche", but only in Buddhist passages
        ("nietzsche", Regex::new(r"\bNietzsche\b").unwrap(), "Nichiren"),
        // "modern" misread as "modem"; modem is occasionally meant
        ("modem", Regex::new(r"(?i)\bmodem\b").unwrap(), "modern"),
        // Lowercase pronoun left by transcription
        ("lowercase_i", Regex::new(r"(?:^|[\s])i(?:[\s]|$)").unwrap(), "I"),
        ("lie_to_he", Regex::new(r"\b(?:and|but|that|when) lie\b").unwrap(), "he"),
    ];

    // Too common to be interesting
    static ref SKIP_WORDS: HashSet<&'static str> = {
        let words = [
            "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
            "by", "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had",
            "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
            "this", "that", "these", "those", "it", "its", "he", "she", "they", "him", "her",
            "them", "his", "their", "my", "your", "our", "who", "which", "what", "when", "how",
            "all", "no", "not", "so", "than", "i", "you", "we", "me", "us",
        ];
        words.into_iter().collect()
    };
}

const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '“', '”', '‘', '’',
];

/// A token that looks like an OCR error, first occurrence only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousWord {
    pub word: String,
    pub reason: String,
    pub count: u64,
    pub context: String,
}

/// Why a word looks wrong, if it does.
pub fn check_suspicious(word: &str) -> Option<&'static str> {
    SUSPICIOUS_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(word))
        .map(|(_, reason)| *reason)
}

/// Text around a byte range, widened to whole ASCII words and with
/// whitespace collapsed. Ellipses mark truncation.
pub fn extract_context(text: &str, start: usize, end: usize, context_chars: usize) -> String {
    let len = text.len();
    let bytes = text.as_bytes();

    let mut from = start.saturating_sub(context_chars);
    while from < len && !text.is_char_boundary(from) {
        from += 1;
    }
    while from > 0 && bytes[from - 1].is_ascii_alphanumeric() {
        from -= 1;
    }

    let mut to = (end + context_chars).min(len);
    while to < len && !text.is_char_boundary(to) {
        to += 1;
    }
    while to < len && bytes[to].is_ascii_alphanumeric() {
        to += 1;
    }

    if from >= to {
        return String::new();
    }

    let mut context = String::new();
    if from > 0 {
        context.push_str("...");
    }
    context.push_str(&text[from..to]);
    if to < len {
        context.push_str("...");
    }
    context.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Suspicious tokens in order of first appearance, at most `limit` of them.
///
/// Tokens are grouped case-insensitively; `count` covers every occurrence.
pub fn scan_suspicious(text: &str, context_chars: usize, limit: usize) -> Vec<SuspiciousWord> {
    let mut found: IndexMap<String, SuspiciousWord> = IndexMap::new();

    for m in TOKEN.find_iter(text) {
        let word = m.as_str().trim_matches(EDGE_PUNCTUATION);
        if word.chars().count() < 2 {
            continue;
        }
        let key = word.to_lowercase();
        if SKIP_WORDS.contains(key.as_str()) {
            continue;
        }

        if let Some(entry) = found.get_mut(&key) {
            entry.count += 1;
            continue;
        }
        if found.len() >= limit {
            continue;
        }
        if let Some(reason) = check_suspicious(word) {
            found.insert(
                key,
                SuspiciousWord {
                    word: word.to_string(),
                    reason: reason.to_string(),
                    count: 1,
                    context: extract_context(text, m.start(), m.end(), context_chars),
                },
            );
        }
    }

    found.into_values().collect()
}

/// Occurrences of each context-dependent pattern; zero counts are omitted.
pub fn count_review_patterns(text: &str) -> IndexMap<String, u64> {
    let mut counts = IndexMap::new();
    for (name, pattern, _likely) in REVIEW_PATTERNS.iter() {
        let count = pattern.find_iter(text).count() as u64;
        if count > 0 {
            counts.insert(name.to_string(), count);
        }
    }
    counts
}

/// Sum of [`count_review_patterns`] across several texts.
pub fn count_review_patterns_batch<'a>(texts: impl IntoIterator<Item = &'a str>) -> HashMap<String, u64> {
    let mut totals = HashMap::new();
    for text in texts {
        for (name, count) in count_review_patterns(text) {
            *totals.entry(name).or_insert(0) += count;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_suspicious_reasons() {
        assert_eq!(check_suspicious("BuJdhahood"), Some("mixed_case"));
        assert_eq!(check_suspicious("B11ddhahood"), Some("digit_in_word"));
        assert_eq!(check_suspicious("Buddhaaa"), Some("triple_repeat"));
        assert_eq!(check_suspicious("Rnddb!st"), Some("stray_symbol"));
        assert_eq!(check_suspicious("Nam-myoho-renge-kyo"), None);
        assert_eq!(check_suspicious("Daishonin's"), None);
    }

    #[test]
    fn test_scan_groups_and_counts() {
        let text = "The BuJdhahood of all. Again bujdhahood, then S111ra.";
        let words = scan_suspicious(text, 10, 10);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "BuJdhahood");
        assert_eq!(words[0].count, 2);
        assert_eq!(words[1].word, "S111ra");
        assert!(words[0].context.contains("BuJdhahood"));
    }

    #[test]
    fn test_scan_respects_limit() {
        let words = scan_suspicious("aB cD eF gH", 5, 2);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn test_extract_context_is_utf8_safe() {
        let text = "é é é target é é é";
        let start = text.find("target").unwrap();
        let context = extract_context(text, start, start + 6, 3);
        assert!(context.contains("target"));
        assert!(context.starts_with("..."));
        assert!(context.ends_with("..."));
    }

    #[test]
    fn test_review_pattern_counts() {
        let text = "Nietzsche taught that i believe. The modem world.\ni said";
        let counts = count_review_patterns(text);
        assert_eq!(counts["nietzsche"], 1);
        assert_eq!(counts["modem"], 1);
        assert_eq!(counts["lowercase_i"], 2);
        assert!(!counts.contains_key("lie_to_he"));
    }

    #[test]
    fn test_batch_totals() {
        let totals = count_review_patterns_batch(["modem", "Modem and modem"]);
        assert_eq!(totals["modem"], 3);
    }
}
