//! Inter-source similarity scoring.
//!
//! Two measures: a character-level matching-blocks ratio over normalized
//! text, and a Jaccard index over the sets of lowercase words. Diff samples
//! are informational only.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::config::SimilarityConfig;
use crate::document::Document;

lazy_static! {
    static ref STRUCTURAL_MARKERS: Vec<Regex> = vec![
        Regex::new(r"OAB_pp\.[^\n]+Page \w+").unwrap(),
        Regex::new(r"---[ \t]*PAGE[ \t]+\d+[ \t]*---").unwrap(),
        Regex::new(r"\[Chapter \d+\]").unwrap(),
    ];
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref WORD: Regex = Regex::new(r"\b[a-z]+\b").unwrap();
}

/// Sequences at least this long get popular-element pruning.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Fold typographic punctuation to ASCII.
fn fold_punctuation(c: char, out: &mut String) {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => out.push('-'),
        '\u{2026}' => out.push_str("..."),
        '\u{00A0}' => out.push(' '),
        _ => out.push(c),
    }
}

/// Canonical comparison form of a text.
///
/// Strips page and chapter markers, collapses horizontal whitespace, drops
/// blank lines and line-edge whitespace, applies NFKC, folds curly quotes,
/// dashes and ellipses to ASCII, and lowercases.
pub fn normalize_for_comparison(text: &str) -> String {
    let mut text = text.to_string();
    for marker in STRUCTURAL_MARKERS.iter() {
        text = marker.replace_all(&text, "").into_owned();
    }

    let mut folded = String::with_capacity(text.len());
    for c in text.nfkc() {
        fold_punctuation(c, &mut folded);
    }

    let lines: Vec<String> = folded
        .lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n").to_lowercase()
}

/// Unique lowercase alphabetic words of a raw text.
pub fn word_set(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// |A ∩ B| / |A ∪ B|; 0 when both sets are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// `2*M / T` over the longest matching blocks of two strings.
///
/// The pair is always matched in lexicographic order, so the result does
/// not depend on argument order. Two empty strings score 1.
pub fn sequence_ratio(a: &str, b: &str, autojunk: bool) -> f64 {
    if a == b {
        return 1.0;
    }
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(&a, &b, autojunk).matched_chars();
    2.0 * matched as f64 / total as f64
}

/// Ratcliff/Obershelp longest-matching-block search.
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each element of `b`, popular elements excluded.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char], autojunk: bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Longest block `(i, j, size)` with `a[i..i+size] == b[j..j+size]`
    /// inside the given bounds, earliest in `a` then in `b` on ties.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut run_at: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run_at = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_at.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            run_at = next_run_at;
        }

        // Popular elements never seed a match but may extend one
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total size of all matching blocks.
    fn matched_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }
}

/// Bounded samples of what differs between two texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffSample {
    pub lines_only_in_first: Vec<String>,
    pub lines_only_in_second: Vec<String>,
    pub words_only_in_first: Vec<String>,
    pub words_only_in_second: Vec<String>,
    pub common_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub ratio: f64,
    pub jaccard: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSample>,
}

/// Scores for one unordered pair of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub first: String,
    pub second: String,
    #[serde(flatten)]
    pub result: SimilarityResult,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    config: SimilarityConfig,
}

impl SimilarityScorer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, a: &str, b: &str) -> SimilarityResult {
        let ratio = sequence_ratio(
            &normalize_for_comparison(a),
            &normalize_for_comparison(b),
            self.config.autojunk,
        );
        SimilarityResult {
            ratio,
            jaccard: jaccard(&word_set(a), &word_set(b)),
            diff: None,
        }
    }

    /// [`score`](Self::score) plus line and word difference samples.
    pub fn score_with_diff(&self, a: &str, b: &str) -> SimilarityResult {
        let norm_a = normalize_for_comparison(a);
        let norm_b = normalize_for_comparison(b);
        let words_a = word_set(a);
        let words_b = word_set(b);

        let lines_a: IndexSet<&str> = norm_a.lines().collect();
        let lines_b: IndexSet<&str> = norm_b.lines().collect();
        let limit = self.config.sample_size;

        let diff = DiffSample {
            lines_only_in_first: sample(lines_a.difference(&lines_b), limit),
            lines_only_in_second: sample(lines_b.difference(&lines_a), limit),
            words_only_in_first: sample(words_a.difference(&words_b), limit),
            words_only_in_second: sample(words_b.difference(&words_a), limit),
            common_words: words_a.intersection(&words_b).count(),
        };

        SimilarityResult {
            ratio: sequence_ratio(&norm_a, &norm_b, self.config.autojunk),
            jaccard: jaccard(&words_a, &words_b),
            diff: Some(diff),
        }
    }

    /// Score every unordered pair once, in input order.
    pub fn similarity_matrix(&self, documents: &[Document]) -> Vec<PairScore> {
        let mut pairs = Vec::new();
        for (i, first) in documents.iter().enumerate() {
            for second in &documents[i + 1..] {
                pairs.push(PairScore {
                    first: first.id().to_string(),
                    second: second.id().to_string(),
                    result: self.score_with_diff(first.content(), second.content()),
                });
            }
        }
        pairs
    }

    /// Candidates ordered by ratio to `reference`, best first; ties by id.
    pub fn rank_by_similarity(&self, reference: &Document, candidates: &[Document]) -> Vec<(String, f64)> {
        let reference = normalize_for_comparison(reference.content());
        let mut ranked: Vec<(String, f64)> = candidates
            .iter()
            .map(|doc| {
                let ratio = sequence_ratio(
                    &reference,
                    &normalize_for_comparison(doc.content()),
                    self.config.autojunk,
                );
                (doc.id().to_string(), ratio)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

fn sample<'a, S: AsRef<str> + 'a>(items: impl Iterator<Item = &'a S>, limit: usize) -> Vec<String> {
    items.take(limit).map(|s| s.as_ref().to_string()).collect()
}
