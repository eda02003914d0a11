//! Per-document storage areas under the index root.
//!
//! A build is staged in a hidden sibling directory and swapped in with
//! renames, so readers only ever see a complete area. Swaps for one store are
//! serialized; overlapping builds of the same identifier resolve to the last
//! swap. The lexical chunk store
//! is required; the vector index is attempted afterwards and its failure only
//! degrades the document to lexical retrieval.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use pdfqa_core::error::{Error, Result};
use pdfqa_core::sanitize::sanitize;
use pdfqa_core::traits::{Embedder, VectorStore};
use pdfqa_core::types::Chunk;
use pdfqa_text::ChunkStore;

/// Names starting with this prefix are build scratch space, never documents.
pub const STAGING_PREFIX: &str = ".pdfqa-";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Rename attempts before a swap gives up against another process.
const SWAP_ATTEMPTS: usize = 3;

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub chunk_count: usize,
    pub semantic: bool,
    pub embedder_id: Option<String>,
    pub source_hash: Option<String>,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub id: String,
    pub chunk_count: usize,
    pub semantic: bool,
    /// Why the vector index was not built, when it was attempted and failed.
    pub semantic_error: Option<String>,
}

/// Handle to an existing storage area. Contents are loaded lazily.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    id: String,
    area: PathBuf,
}

impl DocumentIndex {
    pub fn id(&self) -> &str { &self.id }
    pub fn area(&self) -> &Path { &self.area }
    pub fn chunk_store(&self) -> ChunkStore { ChunkStore::in_area(&self.area) }

    pub fn manifest(&self) -> Result<Option<Manifest>> {
        match std::fs::read(self.area.join(MANIFEST_FILE)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct IndexStore {
    root: PathBuf,
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    max_available: usize,
    swap_lock: Mutex<()>,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>, embedder: Arc<dyn Embedder>, vectors: Arc<dyn VectorStore>) -> Self {
        Self { root: root.into(), embedder, vectors, max_available: 50, swap_lock: Mutex::new(()) }
    }

    pub fn with_max_available(mut self, max_available: usize) -> Self {
        self.max_available = max_available;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }
    pub fn vectors(&self) -> &Arc<dyn VectorStore> { &self.vectors }

    /// Build (or fully replace) the storage area for `id`.
    pub async fn build(&self, id: &str, chunks: Vec<Chunk>, source_hash: Option<String>) -> Result<BuildReport> {
        check_id(id)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let staging = self.scratch_dir("staging", id);
        tokio::fs::create_dir(&staging).await?;

        let built = match self.stage(id, &staging, chunks, source_hash).await {
            Ok(report) => self.swap_in(id, &staging).await.map(|()| report),
            Err(e) => Err(e),
        };
        match built {
            Ok(report) => {
                tracing::info!(id, chunks = report.chunk_count, semantic = report.semantic, "index built");
                Ok(report)
            }
            Err(e) => {
                remove_scratch(&staging).await;
                Err(e)
            }
        }
    }

    pub fn open(&self, id: &str) -> Result<DocumentIndex> {
        let area = self.root.join(id);
        if check_id(id).is_ok() && area.is_dir() {
            return Ok(DocumentIndex { id: id.to_string(), area });
        }
        Err(self.not_found(id))
    }

    /// Sorted identifiers of all storage areas. Empty when the root is missing.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() { continue; }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with(STAGING_PREFIX) { ids.push(name.to_string()); }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn list_limited(&self, limit: usize) -> Result<Vec<String>> {
        let mut ids = self.list()?;
        ids.truncate(limit);
        Ok(ids)
    }

    pub fn not_found(&self, id: &str) -> Error {
        let available = self.list_limited(self.max_available).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list documents");
            Vec::new()
        });
        Error::DocumentNotFound { id: id.to_string(), available }
    }

    async fn stage(&self, id: &str, staging: &Path, chunks: Vec<Chunk>, source_hash: Option<String>) -> Result<BuildReport> {
        let store = ChunkStore::in_area(staging);
        let chunks = tokio::task::spawn_blocking(move || store.write(&chunks).map(|_| chunks))
            .await
            .map_err(|e| Error::Operation(format!("chunk store writer panicked: {e}")))??;

        let (semantic, semantic_error) = if chunks.is_empty() {
            (false, None)
        } else {
            match self.build_semantic(staging, &chunks).await {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::warn!(id, error = %format!("{e:#}"), "semantic index not built, document will use lexical retrieval");
                    (false, Some(format!("{e:#}")))
                }
            }
        };

        let manifest = Manifest {
            id: id.to_string(),
            chunk_count: chunks.len(),
            semantic,
            embedder_id: semantic.then(|| self.embedder.embedder_id().to_string()),
            source_hash,
            built_at: Utc::now(),
        };
        tokio::fs::write(staging.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?).await?;
        Ok(BuildReport { id: id.to_string(), chunk_count: chunks.len(), semantic, semantic_error })
    }

    async fn build_semantic(&self, staging: &Path, chunks: &[Chunk]) -> anyhow::Result<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        self.vectors.upsert(staging, chunks, &vectors).await
    }

    /// Publish `staging` as the area for `id`. A rename that fails because
    /// another writer moved the area in between is retried; any other failure
    /// restores the previous area.
    async fn swap_in(&self, id: &str, staging: &Path) -> Result<()> {
        let _guard = self.swap_lock.lock().await;
        let target = self.root.join(id);
        for attempt in 1..=SWAP_ATTEMPTS {
            let retired = self.scratch_dir("retired", id);
            let had_previous = match tokio::fs::rename(&target, &retired).await {
                Ok(()) => true,
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };
            match tokio::fs::rename(staging, &target).await {
                Ok(()) => {
                    if had_previous { remove_scratch(&retired).await; }
                    return Ok(());
                }
                Err(e) if lost_race(&e) && attempt < SWAP_ATTEMPTS => {
                    tracing::warn!(id, attempt, "area replaced during swap, retrying");
                    if had_previous { remove_scratch(&retired).await; }
                }
                Err(e) => {
                    if had_previous && tokio::fs::metadata(&target).await.is_err() {
                        if let Err(restore) = tokio::fs::rename(&retired, &target).await {
                            tracing::error!(id, error = %restore, "failed to restore previous index");
                        }
                    } else if had_previous {
                        remove_scratch(&retired).await;
                    }
                    return Err(e.into());
                }
            }
        }
        Err(Error::Storage(format!("could not swap in index for '{id}'")))
    }

    fn scratch_dir(&self, kind: &str, id: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{STAGING_PREFIX}{kind}-{id}-{nanos}-{seq}"))
    }
}

/// The target reappeared between the two renames of a swap.
fn lost_race(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::DirectoryNotEmpty | ErrorKind::AlreadyExists)
}

async fn remove_scratch(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch dir"),
    }
}

fn check_id(id: &str) -> Result<()> {
    if sanitize(id) != id {
        return Err(Error::InvalidInput(format!("'{id}' is not a valid document identifier")));
    }
    if id.starts_with(STAGING_PREFIX) {
        return Err(Error::InvalidInput(format!("identifiers may not start with '{STAGING_PREFIX}'")));
    }
    Ok(())
}
