//! Cross-source extraction consensus.
//!
//! Compares the extraction views different sources produced for the same
//! page. The word diff is a set-membership comparison on whitespace tokens:
//! duplicates are deduplicated and word order is ignored. That makes the
//! overlap blind to reordering and repetition; the reported percentages
//! depend on keeping it that way.

use crate::models::{ConsensusReport, Extraction};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum pairwise overlap for two field values to count as agreeing.
pub const FIELD_AGREEMENT_THRESHOLD: u8 = 60;

/// Word-level diff between two texts.
#[derive(Debug, Clone)]
pub struct WordDiff {
    /// Unique tokens of A also present in B.
    pub shared: Vec<String>,
    /// Unique tokens of A absent from B.
    pub removed: Vec<String>,
    /// Unique tokens of B absent from A.
    pub additions: Vec<String>,
    /// shared / (shared + removed + additions), 0-100.
    pub overlap: u8,
}

/// Compute the word diff between texts A and B.
///
/// Tokens are whitespace-separated. Two empty texts agree fully; an empty
/// text against a non-empty one does not agree at all.
pub fn word_diff(a: &str, b: &str) -> WordDiff {
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();

    let shared: Vec<String> = a_tokens
        .intersection(&b_tokens)
        .map(|t| t.to_string())
        .collect();
    let removed: Vec<String> = a_tokens
        .difference(&b_tokens)
        .map(|t| t.to_string())
        .collect();
    let additions: Vec<String> = b_tokens
        .difference(&a_tokens)
        .map(|t| t.to_string())
        .collect();

    let union = shared.len() + removed.len() + additions.len();
    let overlap = if union == 0 {
        100
    } else {
        (shared.len() as f64 / union as f64 * 100.0).round() as u8
    };

    WordDiff {
        shared,
        removed,
        additions,
        overlap,
    }
}

/// Pairwise overlap percentage between two texts.
pub fn overlap_pct(a: &str, b: &str) -> u8 {
    word_diff(a, b).overlap
}

/// Fields compared for per-field consensus.
const CONSENSUS_FIELDS: [&str; 3] = ["title", "description", "mainContent"];

/// Compute overall and per-field consensus across extraction sources.
///
/// Overall consensus is the mean of all pairwise main-content overlaps.
/// Per-field consensus is the fraction of sources whose field value is
/// non-empty and overlaps every other non-empty source's value at or above
/// the agreement threshold.
pub fn consensus(extractions: &BTreeMap<String, Extraction>) -> ConsensusReport {
    if extractions.len() < 2 {
        return ConsensusReport::unavailable();
    }

    let sources: Vec<&Extraction> = extractions.values().collect();

    let mut pair_overlaps = Vec::new();
    for i in 0..sources.len() {
        for j in (i + 1)..sources.len() {
            pair_overlaps.push(overlap_pct(
                &sources[i].main_content,
                &sources[j].main_content,
            ) as f64);
        }
    }

    let overall = (pair_overlaps.iter().sum::<f64>() / pair_overlaps.len() as f64).round() as u8;

    let mut fields = BTreeMap::new();
    for field in CONSENSUS_FIELDS {
        fields.insert(field.to_string(), field_agreement(&sources, field));
    }

    ConsensusReport {
        overall,
        fields,
        available: true,
    }
}

fn field_value<'a>(extraction: &'a Extraction, field: &str) -> &'a str {
    match field {
        "title" => &extraction.title,
        "description" => &extraction.description,
        _ => &extraction.main_content,
    }
}

/// Percentage of sources agreeing on one field.
fn field_agreement(sources: &[&Extraction], field: &str) -> u8 {
    let non_empty: Vec<&str> = sources
        .iter()
        .map(|s| field_value(s, field))
        .filter(|v| !v.trim().is_empty())
        .collect();
    if non_empty.is_empty() {
        return 0;
    }

    let agreeing = (0..non_empty.len())
        .filter(|&i| {
            (0..non_empty.len())
                .filter(|&j| j != i)
                .all(|j| overlap_pct(non_empty[i], non_empty[j]) >= FIELD_AGREEMENT_THRESHOLD)
        })
        .count();

    (agreeing as f64 / sources.len() as f64 * 100.0).round() as u8
}
