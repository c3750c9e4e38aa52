//! Primary source selection.
//!
//! One candidate is taken as ground truth for the whole run; the rest are kept
//! only as confidence signals. Nothing is spliced between candidates.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{Issue, ReconcileError, Result};
use crate::similarity::SimilarityScorer;

/// Outcome of choosing a primary candidate.
#[derive(Debug, Clone)]
pub struct Selection {
    pub primary: Document,
    /// The other usable candidates, most similar to the primary first.
    pub ranked: Vec<RankedSource>,
    /// Candidates that were empty after cleaning.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSource {
    pub id: String,
    pub priority: u32,
    pub ratio: f64,
}

impl Selection {
    /// One issue per skipped candidate.
    pub fn issues(&self) -> Vec<Issue> {
        self.skipped
            .iter()
            .map(|id| Issue::EmptySource { source_id: id.clone() })
            .collect()
    }
}

/// Pick the most trusted non-empty candidate.
///
/// Candidates are ordered by `priority` (lower first), ties broken by id.
/// Fails only when no candidate has any content.
pub fn select_primary(candidates: &[Document], scorer: &SimilarityScorer) -> Result<Selection> {
    let mut ordered: Vec<&Document> = candidates.iter().collect();
    ordered.sort_by(|a, b| a.priority().cmp(&b.priority()).then_with(|| a.id().cmp(b.id())));

    let (usable, empty): (Vec<&Document>, Vec<&Document>) =
        ordered.into_iter().partition(|doc| !doc.is_blank());
    let skipped: Vec<String> = empty.iter().map(|doc| doc.id().to_string()).collect();
    for id in &skipped {
        warn!(source = %id, "source is empty after cleaning, skipping");
    }

    let Some((primary, rest)) = usable.split_first() else {
        return Err(ReconcileError::NoViableSource {
            attempted: candidates.len(),
        });
    };

    let others: Vec<Document> = rest.iter().map(|doc| (*doc).clone()).collect();
    let ranked = scorer
        .rank_by_similarity(primary, &others)
        .into_iter()
        .map(|(id, ratio)| {
            let priority = others
                .iter()
                .find(|doc| doc.id() == id)
                .map(Document::priority)
                .unwrap_or_default();
            RankedSource { id, priority, ratio }
        })
        .collect();

    info!(primary = primary.id(), priority = primary.priority(), "selected primary source");

    Ok(Selection {
        primary: (*primary).clone(),
        ranked,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_priority_wins() {
        let candidates = vec![
            Document::new("pdf", 2, "pdf text"),
            Document::new("transcript", 0, "transcript text"),
            Document::new("ocr", 1, "ocr text"),
        ];
        let selection = select_primary(&candidates, &SimilarityScorer::default()).unwrap();
        assert_eq!(selection.primary.id(), "transcript");
        assert_eq!(selection.ranked.len(), 2);
        assert!(selection.skipped.is_empty());
    }

    #[test]
    fn test_empty_candidate_is_skipped() {
        let candidates = vec![
            Document::new("transcript", 0, "  \n\n "),
            Document::new("ocr", 1, "ocr text"),
        ];
        let selection = select_primary(&candidates, &SimilarityScorer::default()).unwrap();
        assert_eq!(selection.primary.id(), "ocr");
        assert_eq!(selection.skipped, vec!["transcript"]);
        assert_eq!(selection.issues()[0].label(), "empty_source");
    }

    #[test]
    fn test_priority_tie_broken_by_id() {
        let candidates = vec![
            Document::new("b", 0, "text"),
            Document::new("a", 0, "text"),
        ];
        let selection = select_primary(&candidates, &SimilarityScorer::default()).unwrap();
        assert_eq!(selection.primary.id(), "a");
    }

    #[test]
    fn test_no_viable_source() {
        let candidates = vec![Document::new("x", 0, "")];
        let err = select_primary(&candidates, &SimilarityScorer::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::NoViableSource { attempted: 1 }));

        let err = select_primary(&[], &SimilarityScorer::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::NoViableSource { attempted: 0 }));
    }

    #[test]
    fn test_ranked_by_similarity_to_primary() {
        let candidates = vec![
            Document::new("transcript", 0, "the king of sutras"),
            Document::new("pdf", 1, "completely unrelated words"),
            Document::new("ocr", 2, "the king of sutrns"),
        ];
        let selection = select_primary(&candidates, &SimilarityScorer::default()).unwrap();
        assert_eq!(selection.ranked[0].id, "ocr");
        assert_eq!(selection.ranked[0].priority, 2);
    }
}
