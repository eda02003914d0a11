//! Embedding capability: Ollama over HTTP, plus a deterministic hashing
//! embedder for tests and offline development.
use std::sync::Arc;
use std::time::Duration;

use pdfqa_core::config::Settings;
use pdfqa_core::traits::Embedder;

pub mod fake;
pub mod ollama;

pub use fake::FakeEmbedder;
pub use ollama::OllamaEmbedder;

pub fn get_default_embedder(settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    if settings.embedding.use_fake {
        tracing::info!(dim = settings.embedding.fake_dim, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.embedding.fake_dim)));
    }
    let embedder = OllamaEmbedder::new(
        &settings.ollama.base_url,
        &settings.ollama.embed_model,
        Duration::from_secs(settings.ollama.embed_timeout_secs),
    )?;
    tracing::info!(model = %settings.ollama.embed_model, url = %settings.ollama.base_url, "using ollama embedder");
    Ok(Arc::new(embedder))
}
