//! Analysis result cache.
//!
//! Keyed by a SHA-256 signature of the normalized request plus the scoring
//! and prompt versions. A hit returns the stored document unchanged and
//! bypasses the whole pipeline; a version mismatch is strictly a miss, so
//! a result computed under an older algorithm is never served. The cache is
//! an owned component handed to the pipeline, not a process-wide singleton.

use crate::models::{AnalysisDocument, AnalysisRequest};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// The request fields that determine the analysis outcome. User identity
/// and sharing preference are deliberately excluded: identical content
/// produces an identical document regardless of who asked.
#[derive(Serialize)]
struct SignatureView<'a> {
    input_method: &'a crate::models::InputMethod,
    source_url: Option<String>,
    content: &'a Option<String>,
    language: &'a str,
    check_results: &'a std::collections::BTreeMap<String, Vec<crate::models::CheckOutcome>>,
    total_possible_checks: &'a std::collections::BTreeMap<String, usize>,
    extractions: &'a std::collections::BTreeMap<String, crate::models::Extraction>,
}

/// Hex SHA-256 signature of the normalized request.
pub fn request_signature(request: &AnalysisRequest) -> String {
    let view = SignatureView {
        input_method: &request.input_method,
        source_url: request
            .source_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_lowercase()),
        content: &request.content,
        language: &request.language,
        check_results: &request.check_results,
        total_possible_checks: &request.total_possible_checks,
        extractions: &request.extractions,
    };

    // BTreeMap fields serialize in key order, so the signature is stable.
    let bytes = serde_json::to_vec(&view).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

struct CachedEntry {
    scoring_version: String,
    prompt_version: String,
    document: AnalysisDocument,
}

/// Bounded cache of completed analyses.
pub struct AnalysisCache {
    entries: HashMap<String, CachedEntry>,
    insertion_order: VecDeque<String>,
    capacity: usize,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Look up a cached document. Both version tags must match the entry's;
    /// any mismatch is treated as a miss, never an error.
    pub fn get(
        &self,
        signature: &str,
        scoring_version: &str,
        prompt_version: &str,
    ) -> Option<&AnalysisDocument> {
        let entry = self.entries.get(signature)?;
        if entry.scoring_version != scoring_version || entry.prompt_version != prompt_version {
            debug!(
                "cache version mismatch for {}: {}/{} vs {}/{}",
                &signature[..12.min(signature.len())],
                entry.scoring_version,
                entry.prompt_version,
                scoring_version,
                prompt_version
            );
            return None;
        }
        Some(&entry.document)
    }

    /// Store a completed document, evicting the oldest entry when full.
    pub fn insert(&mut self, signature: String, document: AnalysisDocument) {
        if !self.entries.contains_key(&signature) {
            while self.entries.len() >= self.capacity {
                if let Some(oldest) = self.insertion_order.pop_front() {
                    self.entries.remove(&oldest);
                } else {
                    break;
                }
            }
            self.insertion_order.push_back(signature.clone());
        }

        self.entries.insert(
            signature,
            CachedEntry {
                scoring_version: document.scoring_version.clone(),
                prompt_version: document.prompt_version.clone(),
                document,
            },
        );
    }

    #[allow(dead_code)] // Utility accessor
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Utility accessor
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
