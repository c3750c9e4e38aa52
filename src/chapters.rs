//! Chapter segmentation on structural markers.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SegmenterConfig;
use crate::document::{Document, word_count};
use crate::error::{ReconcileError, Result};

const BANNER_WIDTH: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChapterKey {
    /// Everything before the first marker.
    FrontMatter,
    Number(u32),
}

impl ChapterKey {
    /// `front_matter` or `chapter_<n>`.
    pub fn label(&self) -> String {
        match self {
            ChapterKey::FrontMatter => "front_matter".to_string(),
            ChapterKey::Number(n) => format!("chapter_{n}"),
        }
    }

    /// `00_Front_Matter.txt` or `NN_Chapter_N.txt`.
    pub fn file_name(&self) -> String {
        match self {
            ChapterKey::FrontMatter => "00_Front_Matter.txt".to_string(),
            ChapterKey::Number(n) => format!("{n:02}_Chapter_{n}.txt"),
        }
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for ChapterKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// A contiguous slice of the segmented document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub key: ChapterKey,
    /// The marker that opened this chapter, exactly as it appeared.
    pub marker: Option<String>,
    /// Text between this marker and the next, untouched.
    pub raw: String,
}

impl Chapter {
    /// The chapter text without surrounding whitespace.
    pub fn body(&self) -> &str {
        self.raw.trim()
    }
}

/// Render a chapter file: a `=` banner around the title, then the body.
pub fn render_chapter_file(title: &str, body: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{title}\n{rule}\n\n{body}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub key: String,
    pub chars: usize,
    pub words: usize,
}

/// Ordered chapters of one document. The first is always front matter.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub source_id: String,
    pub chapters: Vec<Chapter>,
}

impl Segmentation {
    /// Markers and raw slices concatenated back in order; equals the input.
    pub fn reassemble(&self) -> String {
        let mut text = String::new();
        for chapter in &self.chapters {
            if let Some(marker) = &chapter.marker {
                text.push_str(marker);
            }
            text.push_str(&chapter.raw);
        }
        text
    }

    /// Trimmed bodies by key. A chapter number that appears more than once
    /// (a chapter printed in parts) gets its parts joined by a blank line.
    pub fn by_key(&self) -> IndexMap<ChapterKey, String> {
        let mut merged: IndexMap<ChapterKey, String> = IndexMap::new();
        for chapter in &self.chapters {
            let body = chapter.body();
            let entry = merged.entry(chapter.key).or_default();
            if !body.is_empty() {
                if !entry.is_empty() {
                    entry.push_str("\n\n");
                }
                entry.push_str(body);
            }
        }
        merged
    }

    pub fn summaries(&self) -> Vec<ChapterSummary> {
        self.by_key()
            .iter()
            .map(|(key, body)| ChapterSummary {
                key: key.label(),
                chars: body.chars().count(),
                words: word_count(body),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    marker: Regex,
}

impl ChapterSegmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        let marker = Regex::new(&config.marker_pattern)?;
        if marker.captures_len() < 2 {
            return Err(ReconcileError::Config(
                "chapter marker pattern needs a capture group for the chapter number".to_string(),
            ));
        }
        Ok(Self { marker })
    }

    /// Split a document at every marker whose captured number parses.
    /// Markers that do not parse stay in the text as content.
    pub fn segment(&self, document: &Document) -> Segmentation {
        let text = document.content();
        let mut chapters = Vec::new();
        let mut key = ChapterKey::FrontMatter;
        let mut marker: Option<String> = None;
        let mut start = 0;

        for caps in self.marker.captures_iter(text) {
            let Some(number) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            chapters.push(Chapter {
                key,
                marker: marker.take(),
                raw: text[start..whole.start()].to_string(),
            });
            key = ChapterKey::Number(number);
            marker = Some(whole.as_str().to_string());
            start = whole.end();
        }
        chapters.push(Chapter {
            key,
            marker,
            raw: text[start..].to_string(),
        });

        debug!(source = document.id(), chapters = chapters.len(), "segmented document");

        Segmentation {
            source_id: document.id().to_string(),
            chapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> ChapterSegmenter {
        ChapterSegmenter::new(&SegmenterConfig::default()).unwrap()
    }

    #[test]
    fn test_front_matter_and_chapters() {
        let doc = Document::new("t", 0, "[Chapter 1]\nAlpha\n[Chapter 2]\nBeta");
        let seg = segmenter().segment(&doc);
        let keyed = seg.by_key();

        let labels: Vec<String> = keyed.keys().map(ChapterKey::label).collect();
        assert_eq!(labels, vec!["front_matter", "chapter_1", "chapter_2"]);
        assert_eq!(keyed[&ChapterKey::FrontMatter], "");
        assert_eq!(keyed[&ChapterKey::Number(1)], "Alpha");
        assert_eq!(keyed[&ChapterKey::Number(2)], "Beta");
        assert_eq!(seg.reassemble(), doc.content());
    }

    #[test]
    fn test_no_markers_is_all_front_matter() {
        let doc = Document::new("t", 0, "Title\n\nContents");
        let seg = segmenter().segment(&doc);
        assert_eq!(seg.chapters.len(), 1);
        assert_eq!(seg.chapters[0].key, ChapterKey::FrontMatter);
        assert_eq!(seg.chapters[0].raw, "Title\n\nContents");
    }

    #[test]
    fn test_repeated_chapter_parts_merge() {
        let doc = Document::new("t", 0, "Intro\n[Chapter 3]\nPart one\n[Chapter 3]\nPart two");
        let keyed = segmenter().segment(&doc).by_key();
        assert_eq!(keyed.len(), 2);
        assert_eq!(keyed[&ChapterKey::Number(3)], "Part one\n\nPart two");
    }

    #[test]
    fn test_unparseable_marker_stays_in_text() {
        let doc = Document::new("t", 0, "A [Chapter 99999999999] B");
        let seg = segmenter().segment(&doc);
        assert_eq!(seg.chapters.len(), 1);
        assert_eq!(seg.reassemble(), doc.content());
    }

    #[test]
    fn test_file_names_and_banner() {
        assert_eq!(ChapterKey::FrontMatter.file_name(), "00_Front_Matter.txt");
        assert_eq!(ChapterKey::Number(7).file_name(), "07_Chapter_7.txt");
        assert_eq!(ChapterKey::Number(12).file_name(), "12_Chapter_12.txt");

        let rendered = render_chapter_file("The Mystic Nature of Our Lives", "Body");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0].len(), 70);
        assert_eq!(lines[1], "The Mystic Nature of Our Lives");
        assert_eq!(lines[4], "Body");
    }

    #[test]
    fn test_marker_without_group_rejected() {
        let config = SegmenterConfig {
            marker_pattern: r"\[Chapter \d+\]".to_string(),
            ..SegmenterConfig::default()
        };
        assert!(ChapterSegmenter::new(&config).is_err());
    }
}
