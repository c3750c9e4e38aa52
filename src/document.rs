//! Candidate renderings of the source book.

use serde::{Deserialize, Serialize};

/// One candidate rendering of the source book.
///
/// Documents are never mutated. Every stage returns a new `Document` derived
/// from its input through [`Document::derive`], so the same loaded text can be
/// pushed through different stages side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    priority: u32,
    content: String,
}

impl Document {
    /// Create a document. Lower `priority` means more trusted.
    pub fn new(id: impl Into<String>, priority: u32, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            content: content.into(),
        }
    }

    /// A new document with the same identity and provenance but new content.
    pub fn derive(&self, content: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            priority: self.priority,
            content: content.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of Unicode scalar values.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    /// True when the document holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Whitespace-separated word count, the measure used throughout reports.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_keeps_provenance() {
        let doc = Document::new("acrobat", 2, "Nichrn Daishonin");
        let derived = doc.derive("Nichiren Daishonin");

        assert_eq!(derived.id(), "acrobat");
        assert_eq!(derived.priority(), 2);
        assert_eq!(derived.content(), "Nichiren Daishonin");
        assert_eq!(doc.content(), "Nichrn Daishonin");
    }

    #[test]
    fn test_counts() {
        let doc = Document::new("a", 0, "  one two\nthree  ");
        assert_eq!(doc.word_count(), 3);
        assert_eq!(doc.char_count(), 17);
        assert!(!doc.is_blank());
        assert!(Document::new("b", 0, " \n\t").is_blank());
    }
}
