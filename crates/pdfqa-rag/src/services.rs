use std::sync::Arc;

use pdfqa_core::config::Settings;
use pdfqa_core::traits::{Embedder, LanguageModel, TextExtractor, UploadMirror, VectorStore};
use pdfqa_vector::LanceVectorStore;

use crate::extract::PdftotextExtractor;
use crate::mirror::HttpPutMirror;

/// External capabilities used by the pipeline. Tests swap in their own.
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn Embedder>,
    pub vectors: Arc<dyn VectorStore>,
    pub model: Arc<dyn LanguageModel>,
    pub extractor: Arc<dyn TextExtractor>,
    pub mirror: Arc<dyn UploadMirror>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            embedder: pdfqa_embed::get_default_embedder(settings)?,
            vectors: Arc::new(LanceVectorStore::from_settings(&settings.vector)),
            model: pdfqa_llm::get_default_model(settings)?,
            extractor: Arc::new(PdftotextExtractor::from_settings(&settings.extract)),
            mirror: Arc::new(HttpPutMirror::from_settings(&settings.mirror)?),
        })
    }
}
