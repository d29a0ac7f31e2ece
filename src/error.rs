//! Error types for the scoring engine.
//!
//! Validation failures are rejected before the pipeline runs; cancellation
//! and persistence failures are distinct so callers can react differently
//! (a persistence failure is retryable at the caller level, a cancellation
//! is not an error condition worth retrying).

use thiserror::Error;

/// Errors produced by the analysis pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed input: bad URL, empty content, or an unknown category key.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The run was cancelled before the commit step. Nothing was persisted.
    #[error("analysis cancelled before commit")]
    Cancelled,

    /// The document store was unreachable or rejected the write at commit
    /// time. Fatal for the current run; the caller owns the retry policy.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A non-commit storage operation failed (read, delete, sweep).
    #[error("storage error: {0}")]
    Storage(String),

    /// The score history store could not be read.
    #[error("history store error: {0}")]
    History(String),

    /// A document could not be serialized for size estimation or persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// True when the error is a pre-pipeline input rejection.
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::Validation(_))
    }
}
