use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::types::{Chunk, SearchHit, TextUnit};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `ollama:nomic-embed-text`).
    fn embedder_id(&self) -> &str;

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Vector persistence scoped to one document storage area.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, area: &Path, chunks: &[Chunk], vectors: &[Vec<f32>]) -> anyhow::Result<()>;
    async fn nearest(&self, area: &Path, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str, opts: &CompletionOptions) -> anyhow::Result<String>;
}

/// Turns a document on disk into ordered text units. Blocking.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, source_name: &str) -> anyhow::Result<Vec<TextUnit>>;
}

/// Best-effort copy of a raw upload to object storage.
///
/// `Ok(false)` means mirroring is not configured.
#[async_trait]
pub trait UploadMirror: Send + Sync {
    async fn mirror(&self, bytes: &[u8], object_name: &str) -> anyhow::Result<bool>;
}
