//! Vector store capability over LanceDB.
//!
//! Each document storage area holds its own LanceDB database; the chunk
//! vectors live in one table named after the configured collection.
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use pdfqa_core::config::VectorSettings;
use pdfqa_core::error::ServiceError;
use pdfqa_core::traits::VectorStore;
use pdfqa_core::types::{Chunk, SearchHit};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

#[derive(Debug, Clone)]
pub struct LanceVectorStore {
    collection: String,
    timeout: Duration,
}

impl LanceVectorStore {
    pub fn new(collection: impl Into<String>, timeout: Duration) -> Self {
        Self { collection: collection.into(), timeout }
    }

    pub fn from_settings(settings: &VectorSettings) -> Self {
        Self::new(settings.collection.clone(), Duration::from_secs(settings.timeout_secs))
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Unavailable(format!("vector store {op} timed out after {:?}", self.timeout)).into()),
        }
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn upsert(&self, area: &Path, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() { return Ok(()); }
        self.bounded("write", self.write(area, chunks, vectors)).await
    }

    async fn nearest(&self, area: &Path, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if !area.is_dir() {
            return Err(ServiceError::MissingIndex(format!("no storage area at {}", area.display())).into());
        }
        self.bounded("search", self.search(area, query_vec, k)).await
    }
}

impl LanceVectorStore {
    async fn write(&self, area: &Path, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        let conn = table::open_db(area).await?;
        let rows = writer::write_table(&conn, &self.collection, chunks, vectors).await?;
        tracing::info!(area = %area.display(), table = %self.collection, rows, "vector index written");
        Ok(())
    }

    async fn search(&self, area: &Path, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let conn = table::open_db(area).await.map_err(|e| ServiceError::Corrupt(e.to_string()))?;
        let exists = table::table_exists(&conn, &self.collection).await.map_err(|e| ServiceError::Corrupt(e.to_string()))?;
        if !exists {
            return Err(ServiceError::MissingIndex(format!("table '{}' not found in {}", self.collection, area.display())).into());
        }
        if k == 0 { return Ok(Vec::new()); }
        let hits = search::nearest(&conn, &self.collection, query_vec, k).await.map_err(|e| ServiceError::Corrupt(e.to_string()))?;
        Ok(hits)
    }
}
