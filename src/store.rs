//! JSON corpus persistence and in-memory snapshots.
//!
//! The corpus lives in a single JSON file: an ordered list of document
//! entries, each holding its chunk records `{id, text, source,
//! section_type, embedding}` in chunk order. Writes go through a
//! temp-file-and-rename so a crashed ingest never leaves a torn file.
//!
//! At query time the corpus is an immutable [`Corpus`] snapshot: an
//! `Arc` handed out by [`Corpus::snapshot`]. Ingestion builds a new
//! chunk list and swaps the `Arc`, so a query observes either the pre-
//! or post-ingestion corpus, never a partial one. No locks are held
//! while a query runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use docket_core::models::Chunk;
use docket_core::DocketError;

/// One ingested document and its chunk records, in chunk order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub document_id: String,
    /// Original filename; also each chunk's `source`.
    pub filename: String,
    /// SHA-256 of the cleaned full text, used to skip unchanged re-ingests.
    pub content_hash: String,
    pub ingested_at: DateTime<Utc>,
    pub chunks: Vec<Chunk>,
}

/// On-disk corpus layout: documents in ingestion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusFile {
    pub documents: Vec<DocumentEntry>,
}

impl CorpusFile {
    /// Flatten all chunk records in document order, then chunk order.
    pub fn all_chunks(&self) -> Vec<Chunk> {
        self.documents
            .iter()
            .flat_map(|d| d.chunks.iter().cloned())
            .collect()
    }

    /// Whether `filename` is already stored with this exact content.
    pub fn is_current(&self, filename: &str, content_hash: &str) -> bool {
        self.documents
            .iter()
            .any(|d| d.filename == filename && d.content_hash == content_hash)
    }

    /// Insert or replace the entry for `entry.filename`.
    pub fn upsert(&mut self, entry: DocumentEntry) {
        if let Some(existing) = self
            .documents
            .iter_mut()
            .find(|d| d.filename == entry.filename)
        {
            *existing = entry;
        } else {
            self.documents.push(entry);
        }
    }
}

/// SHA-256 content hash of a document's cleaned text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed corpus store.
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the corpus file, validating that every embedded chunk
    /// shares one embedding dimension. A missing file is an empty
    /// corpus, not an error.
    pub fn load(&self) -> Result<CorpusFile, DocketError> {
        if !self.path.exists() {
            return Ok(CorpusFile::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: CorpusFile = serde_json::from_str(&raw)
            .map_err(|e| DocketError::Corpus(format!("{}: {}", self.path.display(), e)))?;

        let mut dims: Option<usize> = None;
        for entry in &file.documents {
            for chunk in &entry.chunks {
                if let Some(v) = &chunk.embedding {
                    match dims {
                        None => dims = Some(v.len()),
                        Some(d) if d != v.len() => {
                            return Err(DocketError::Corpus(format!(
                                "chunk {} has embedding dimension {} but corpus uses {}",
                                chunk.id,
                                v.len(),
                                d
                            )));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(file)
    }

    /// Persist the corpus atomically: write a sibling temp file, then
    /// rename it over the target.
    pub fn save(&self, file: &CorpusFile) -> Result<(), DocketError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let raw = serde_json::to_string(file)
            .map_err(|e| DocketError::Corpus(format!("serialize corpus: {}", e)))?;
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            documents = file.documents.len(),
            "corpus saved"
        );
        Ok(())
    }
}

/// In-memory corpus with atomic snapshot semantics.
pub struct Corpus {
    inner: RwLock<Arc<Vec<Chunk>>>,
}

impl Corpus {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(chunks)),
        }
    }

    /// An immutable view for the duration of one query.
    pub fn snapshot(&self) -> Arc<Vec<Chunk>> {
        self.inner.read().expect("corpus lock poisoned").clone()
    }

    /// Swap in a freshly built chunk list after an ingest commits.
    pub fn replace(&self, chunks: Vec<Chunk>) {
        *self.inner.write().expect("corpus lock poisoned") = Arc::new(chunks);
    }
}
