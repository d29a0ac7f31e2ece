//! Storage modules.
//!
//! The size guard keeps documents under the store's per-document ceiling;
//! the store module provides the persistence traits, file-backed
//! implementations, and the retention sweep.

pub mod size_guard;
pub mod store;

pub use size_guard::{estimate_size, truncate_to_fit, TruncationOutcome, DEFAULT_SIZE_CEILING};
pub use store::{
    DocumentStore, JsonFileStore, JsonHistoryStore, RetentionPolicy, ScoreHistoryStore,
};

#[cfg(test)]
pub use store::{MemoryHistoryStore, MemoryStore};
