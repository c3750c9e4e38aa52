//! Must-contain phrase checks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::Document;
use crate::error::Issue;

/// Phrase → found, in checklist order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationReport {
    pub results: IndexMap<String, bool>,
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.results.values().filter(|&&found| found).count()
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, found)| !**found)
            .map(|(phrase, _)| phrase.as_str())
    }

    pub fn all_found(&self) -> bool {
        self.results.values().all(|&found| found)
    }

    /// One issue per phrase that was not found.
    pub fn issues(&self) -> Vec<Issue> {
        self.missing()
            .map(|phrase| Issue::VerificationFailure {
                phrase: phrase.to_string(),
            })
            .collect()
    }
}

/// Case-insensitive substring check of each phrase against `text`.
pub fn verify(text: &str, phrases: &[String]) -> VerificationReport {
    let haystack = text.to_lowercase();
    let mut results = IndexMap::new();
    for phrase in phrases {
        let found = haystack.contains(&phrase.to_lowercase());
        if !found {
            warn!(phrase = %phrase, "key phrase not found");
        }
        results.insert(phrase.clone(), found);
    }
    VerificationReport { results }
}

/// For each phrase, the ids of the candidates that contain it.
pub fn cross_check(phrases: &[String], documents: &[Document]) -> IndexMap<String, Vec<String>> {
    let lowered: Vec<(&str, String)> = documents
        .iter()
        .map(|doc| (doc.id(), doc.content().to_lowercase()))
        .collect();

    phrases
        .iter()
        .map(|phrase| {
            let needle = phrase.to_lowercase();
            let sources = lowered
                .iter()
                .filter(|(_, text)| text.contains(&needle))
                .map(|(id, _)| id.to_string())
                .collect();
            (phrase.clone(), sources)
        })
        .collect()
}
