//! Loading candidate renderings from disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{Issue, ReconcileError, Result};

/// Where one candidate lives and how much it is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    pub path: PathBuf,
    /// Lower is more trusted.
    #[serde(default)]
    pub priority: u32,
}

impl SourceSpec {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, priority: u32) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            priority,
        }
    }
}

/// Which decoding produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

/// Decode raw bytes: UTF-8 first (BOM dropped), Latin-1 otherwise.
///
/// Latin-1 maps every byte to a char, so decoding never fails.
pub fn decode_text(bytes: &[u8]) -> (String, Encoding) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), Encoding::Utf8),
        Err(_) => (bytes.iter().map(|&b| b as char).collect(), Encoding::Latin1),
    }
}

/// Read a text file with encoding fallback.
pub fn load_text(path: &Path) -> std::io::Result<(String, Encoding)> {
    let bytes = std::fs::read(path)?;
    Ok(decode_text(&bytes))
}

pub fn load_document(spec: &SourceSpec) -> Result<Document> {
    let (text, encoding) =
        load_text(&spec.path).map_err(|source| ReconcileError::SourceUnavailable {
            id: spec.id.clone(),
            path: spec.path.clone(),
            source,
        })?;
    if encoding != Encoding::Utf8 {
        warn!(source = %spec.id, path = %spec.path.display(), "not valid UTF-8, decoded as Latin-1");
    }
    info!(source = %spec.id, chars = text.chars().count(), "loaded source");
    Ok(Document::new(spec.id.clone(), spec.priority, text))
}

/// Load every declared source. Unreadable ones are skipped and reported.
pub fn load_sources(specs: &[SourceSpec]) -> (Vec<Document>, Vec<Issue>) {
    let mut documents = Vec::new();
    let mut issues = Vec::new();

    for spec in specs {
        match load_document(spec) {
            Ok(doc) => documents.push(doc),
            Err(err) => {
                warn!(source = %spec.id, error = %err, "skipping unavailable source");
                issues.push(Issue::SourceUnavailable {
                    source_id: spec.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    (documents, issues)
}
