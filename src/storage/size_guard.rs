//! Document size estimation and truncation.
//!
//! The backing document store enforces a hard per-document limit of about
//! 1 MiB. Documents are shrunk to a ceiling with safety margin below that
//! limit by discarding the lowest-priority, highest-volume fields first:
//! extraction bodies, then verbose check messages, then whole extraction
//! views. Score fields are never touched.

use crate::error::AnalysisError;
use crate::models::AnalysisDocument;
use tracing::warn;

/// Target ceiling in bytes, with safety margin under the ~1 MiB store cap.
pub const DEFAULT_SIZE_CEILING: usize = 900_000;

/// Successively smaller caps (in characters) applied to extraction bodies.
const CONTENT_CAP_STEPS: [usize; 4] = [20_000, 8_000, 2_000, 400];

/// Cap (in characters) applied to check messages when bodies alone are not
/// enough.
const MESSAGE_CAP: usize = 160;

/// Result of a truncation pass.
#[derive(Debug, Clone)]
pub struct TruncationOutcome {
    pub document: AnalysisDocument,
    /// True when truncation actually discarded data. Must be surfaced to
    /// the caller, never swallowed.
    pub overflow: bool,
}

/// Approximate serialized byte size of a document.
pub fn estimate_size(document: &AnalysisDocument) -> Result<usize, AnalysisError> {
    Ok(serde_json::to_vec(document)?.len())
}

/// Shrink a document until its estimated size fits the ceiling.
///
/// If the document is irreducible (still over the ceiling after every
/// shrinking step), it is returned as-is with `overflow` set; the caller
/// decides whether to persist it anyway.
pub fn truncate_to_fit(
    mut document: AnalysisDocument,
    ceiling: usize,
) -> Result<TruncationOutcome, AnalysisError> {
    if estimate_size(&document)? <= ceiling {
        return Ok(TruncationOutcome {
            document,
            overflow: false,
        });
    }

    let mut overflow = false;

    // Step 1: progressively cap extraction bodies.
    for cap in CONTENT_CAP_STEPS {
        for extraction in document.llm_extractions.values_mut() {
            if extraction.main_content.chars().count() > cap {
                extraction.main_content = extraction.main_content.chars().take(cap).collect();
                extraction.truncated = true;
                overflow = true;
            }
        }
        if estimate_size(&document)? <= ceiling {
            return Ok(TruncationOutcome { document, overflow });
        }
    }

    // Step 2: cap verbose check messages.
    for outcomes in document.check_results.values_mut() {
        for outcome in outcomes {
            if outcome.message.chars().count() > MESSAGE_CAP {
                outcome.message = outcome.message.chars().take(MESSAGE_CAP).collect();
                overflow = true;
            }
        }
    }
    if estimate_size(&document)? <= ceiling {
        return Ok(TruncationOutcome { document, overflow });
    }

    // Step 3: drop the extraction views entirely. Consensus numbers stay.
    if !document.llm_extractions.is_empty() {
        document.llm_extractions.clear();
        overflow = true;
    }

    let final_size = estimate_size(&document)?;
    if final_size > ceiling {
        warn!(
            "document {} irreducible: {} bytes over {} ceiling",
            document.id, final_size, ceiling
        );
        overflow = true;
    }

    Ok(TruncationOutcome { document, overflow })
}
