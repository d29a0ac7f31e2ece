//! Persistence traits and file-backed stores.
//!
//! The document store holds one JSON document per analysis id. The history
//! store is an append-only per-user score series; the engine only reads it.
//! Both are blocking I/O boundaries for the pipeline. The retention policy
//! drives hard deletion of old documents, independent of share expiry.

use crate::error::AnalysisError;
use crate::models::{AnalysisDocument, ScoreHistoryEntry};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;
use tracing::{debug, info};

/// Persistence for completed analysis documents.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Persist a document. Failures here are commit failures.
    async fn put(&self, document: &AnalysisDocument) -> Result<(), AnalysisError>;

    /// Fetch a document by id.
    async fn get(&self, id: &str) -> Result<Option<AnalysisDocument>, AnalysisError>;

    /// Remove a document by id. Removing a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), AnalysisError>;

    /// List all stored document ids.
    async fn list_ids(&self) -> Result<Vec<String>, AnalysisError>;
}

/// Read access to a user's historical scores, oldest first.
#[allow(async_fn_in_trait)]
pub trait ScoreHistoryStore {
    async fn history(&self, user_id: &str) -> Result<Vec<ScoreHistoryEntry>, AnalysisError>;
}

/// Governs hard deletion of analysis documents by age.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { days: 180 }
    }
}

impl RetentionPolicy {
    /// Documents analyzed before this instant are eligible for deletion.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }

    /// Delete all documents past the retention cutoff. Returns the number
    /// removed.
    pub async fn sweep<S: DocumentStore>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<usize, AnalysisError> {
        let cutoff = self.cutoff(now);
        let mut removed = 0;

        for id in store.list_ids().await? {
            if let Some(document) = store.get(&id).await? {
                if document.analyzed_at < cutoff {
                    store.delete(&id).await?;
                    debug!("retention sweep removed {}", id);
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("retention sweep removed {} document(s)", removed);
        }
        Ok(removed)
    }
}

/// One JSON file per document under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl DocumentStore for JsonFileStore {
    async fn put(&self, document: &AnalysisDocument) -> Result<(), AnalysisError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AnalysisError::Persistence(format!("create store dir: {e}")))?;

        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| AnalysisError::Persistence(format!("encode document: {e}")))?;

        tokio::fs::write(self.path_for(&document.id), bytes)
            .await
            .map_err(|e| AnalysisError::Persistence(format!("write document: {e}")))
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisDocument>, AnalysisError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => {
                let document = serde_json::from_slice(&bytes)
                    .map_err(|e| AnalysisError::Storage(format!("decode {id}: {e}")))?;
                Ok(Some(document))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AnalysisError::Storage(format!("read {id}: {e}"))),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AnalysisError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AnalysisError::Storage(format!("delete {id}: {e}"))),
        }
    }

    async fn list_ids(&self) -> Result<Vec<String>, AnalysisError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AnalysisError::Storage(format!("list store: {e}"))),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AnalysisError::Storage(format!("list store: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

/// Per-user score series stored as one JSON map file.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Vec<ScoreHistoryEntry>>, AnalysisError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AnalysisError::History(format!("decode history: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AnalysisError::History(format!("read history: {e}"))),
        }
    }

    /// Append one entry to a user's series. The engine itself never calls
    /// this; the caller appends after a successful commit.
    pub async fn append(
        &self,
        user_id: &str,
        entry: ScoreHistoryEntry,
    ) -> Result<(), AnalysisError> {
        let mut all = self.read_all().await?;
        all.entry(user_id.to_string()).or_default().push(entry);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AnalysisError::History(format!("create history dir: {e}")))?;
        }

        let bytes = serde_json::to_vec_pretty(&all)
            .map_err(|e| AnalysisError::History(format!("encode history: {e}")))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| AnalysisError::History(format!("write history: {e}")))
    }
}

impl ScoreHistoryStore for JsonHistoryStore {
    async fn history(&self, user_id: &str) -> Result<Vec<ScoreHistoryEntry>, AnalysisError> {
        Ok(self.read_all().await?.remove(user_id).unwrap_or_default())
    }
}

/// In-memory document store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, AnalysisDocument>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl DocumentStore for MemoryStore {
    async fn put(&self, document: &AnalysisDocument) -> Result<(), AnalysisError> {
        self.documents
            .lock()
            .map_err(|_| AnalysisError::Persistence("store lock poisoned".to_string()))?
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<AnalysisDocument>, AnalysisError> {
        Ok(self
            .documents
            .lock()
            .map_err(|_| AnalysisError::Storage("store lock poisoned".to_string()))?
            .get(id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), AnalysisError> {
        self.documents
            .lock()
            .map_err(|_| AnalysisError::Storage("store lock poisoned".to_string()))?
            .remove(id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self
            .documents
            .lock()
            .map_err(|_| AnalysisError::Storage("store lock poisoned".to_string()))?
            .keys()
            .cloned()
            .collect())
    }
}

/// In-memory single-user history store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<ScoreHistoryEntry>>,
}

#[cfg(test)]
impl MemoryHistoryStore {
    pub fn new(entries: Vec<ScoreHistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[cfg(test)]
impl ScoreHistoryStore for MemoryHistoryStore {
    async fn history(&self, _user_id: &str) -> Result<Vec<ScoreHistoryEntry>, AnalysisError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| AnalysisError::History("history lock poisoned".to_string()))?
            .clone())
    }
}
