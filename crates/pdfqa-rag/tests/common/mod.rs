#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdfqa_core::config::Settings;
use pdfqa_core::error::ServiceError;
use pdfqa_core::traits::{CompletionOptions, Embedder, LanguageModel, TextExtractor, UploadMirror, VectorStore};
use pdfqa_core::types::{Chunk, Meta, SearchHit, TextUnit};
use pdfqa_embed::FakeEmbedder;
use pdfqa_rag::Services;
use pdfqa_vector::LanceVectorStore;

pub const UNIQUE_TERM: &str = "zygomorphic";

pub fn paragraph(tag: &str) -> String {
    format!("{tag} {}", "homestead notes about gardens and water ".repeat(22)).trim_end().to_string()
}

/// Three pages that chunk into 3 + 2 + 2 chunks; the fifth chunk alone
/// mentions [`UNIQUE_TERM`].
pub fn three_page_units(source: &str) -> Vec<TextUnit> {
    let pages = [
        vec![paragraph("one"), paragraph("two"), paragraph("three")],
        vec![paragraph("four"), paragraph(&format!("{UNIQUE_TERM} blossoms"))],
        vec![paragraph("six"), paragraph("seven")],
    ];
    pages
        .into_iter()
        .enumerate()
        .map(|(i, paras)| {
            let mut meta = Meta::new();
            meta.insert("source".into(), source.into());
            meta.insert("page".into(), i.into());
            TextUnit::new(paras.join("\n\n"), meta)
        })
        .collect()
}

pub fn three_page_chunks() -> Vec<Chunk> {
    pdfqa_core::chunker::Chunker::default().chunk(&three_page_units("report.pdf"))
}

pub fn fast_vectors() -> Arc<LanceVectorStore> {
    Arc::new(LanceVectorStore::new("docs", Duration::from_secs(30)))
}

/// Embedder that always fails with the given service error class.
pub struct FailingEmbedder {
    pub make: fn() -> ServiceError,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self { make: || ServiceError::Unavailable("connection refused".into()), calls: AtomicUsize::new(0) })
    }

    pub fn misconfigured() -> Arc<Self> {
        Arc::new(Self { make: || ServiceError::Misconfigured("model \"nope\" not found".into()), calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn embedder_id(&self) -> &str { "failing" }

    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make)().into())
    }
}

/// Vector store that accepts writes and always answers with no rows.
pub struct EmptyVectorStore;

#[async_trait]
impl VectorStore for EmptyVectorStore {
    async fn upsert(&self, _area: &Path, _chunks: &[Chunk], _vectors: &[Vec<f32>]) -> anyhow::Result<()> { Ok(()) }
    async fn nearest(&self, _area: &Path, _query_vec: &[f32], _k: usize) -> anyhow::Result<Vec<SearchHit>> { Ok(Vec::new()) }
}

/// Records prompts and replies with a canned answer, or fails.
pub struct MockModel {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn answering(reply: &str) -> Arc<Self> { Arc::new(Self { reply: Some(reply.to_string()), prompts: Mutex::new(Vec::new()) }) }
    pub fn failing() -> Arc<Self> { Arc::new(Self { reply: None, prompts: Mutex::new(Vec::new()) }) }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn model_id(&self) -> &str { "mock" }

    async fn complete(&self, prompt: &str, _opts: &CompletionOptions) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ServiceError::Unavailable("model server down".into()).into()),
        }
    }
}

/// Ignores the file and returns fixed pages.
pub struct FixedExtractor(pub Vec<TextUnit>);

impl TextExtractor for FixedExtractor {
    fn extract(&self, path: &Path, _source_name: &str) -> anyhow::Result<Vec<TextUnit>> {
        anyhow::ensure!(path.is_file(), "upload copy missing at {}", path.display());
        Ok(self.0.clone())
    }
}

pub struct FailingMirror;

#[async_trait]
impl UploadMirror for FailingMirror {
    async fn mirror(&self, _bytes: &[u8], _object_name: &str) -> anyhow::Result<bool> {
        anyhow::bail!("access denied")
    }
}

pub fn settings_in(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.index.root = root.join("indexes").to_string_lossy().to_string();
    settings.index.uploads_dir = root.join("uploads").to_string_lossy().to_string();
    settings
}

pub fn services(embedder: Arc<dyn Embedder>, vectors: Arc<dyn VectorStore>, model: Arc<dyn LanguageModel>) -> Services {
    Services {
        embedder,
        vectors,
        model,
        extractor: Arc::new(FixedExtractor(three_page_units("report.pdf"))),
        mirror: Arc::new(pdfqa_rag::mirror::NoopMirror),
    }
}

pub fn fake_embedder() -> Arc<FakeEmbedder> { Arc::new(FakeEmbedder::new(256)) }
