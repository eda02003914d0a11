//! Two-tier retrieval: semantic nearest neighbours first, TF-IDF over the
//! durable chunk store when the semantic tier fails for any reason.
use serde::Serialize;
use std::sync::Arc;

use pdfqa_core::error::{Error, Result, ServiceError};
use pdfqa_core::types::SearchHit;
use pdfqa_text::rank;

use crate::index_store::{DocumentIndex, IndexStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticFailure {
    Unavailable,
    MissingIndex,
    EmptyIndex,
    Corrupt,
    Misconfigured,
    Other,
}

impl SemanticFailure {
    pub fn classify(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ServiceError>() {
            Some(ServiceError::Unavailable(_)) => Self::Unavailable,
            Some(ServiceError::MissingIndex(_)) => Self::MissingIndex,
            Some(ServiceError::Corrupt(_)) => Self::Corrupt,
            Some(ServiceError::Misconfigured(_)) => Self::Misconfigured,
            None => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum RetrievalPath {
    Semantic,
    LexicalFallback { reason: SemanticFailure },
}

impl RetrievalPath {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::LexicalFallback { .. } => "lexical",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub passages: Vec<String>,
    pub path: RetrievalPath,
}

pub struct Retriever {
    store: Arc<IndexStore>,
}

impl Retriever {
    pub fn new(store: Arc<IndexStore>) -> Self { Self { store } }

    pub async fn retrieve(&self, id: &str, query: &str, k: usize) -> Result<Retrieval> {
        let index = self.store.open(id)?;
        self.retrieve_in(&index, query, k).await
    }

    pub async fn retrieve_in(&self, index: &DocumentIndex, query: &str, k: usize) -> Result<Retrieval> {
        if k == 0 { return Ok(Retrieval { passages: Vec::new(), path: RetrievalPath::Semantic }); }
        let reason = match self.semantic(index, query, k).await {
            Ok(hits) if !hits.is_empty() => {
                tracing::debug!(id = index.id(), hits = hits.len(), "semantic retrieval");
                return Ok(Retrieval { passages: hits.into_iter().map(|h| h.text).collect(), path: RetrievalPath::Semantic });
            }
            Ok(_) => {
                tracing::warn!(id = index.id(), "semantic retrieval returned no rows, falling back to lexical");
                SemanticFailure::EmptyIndex
            }
            Err(e) => {
                let reason = SemanticFailure::classify(&e);
                if reason == SemanticFailure::Misconfigured {
                    tracing::error!(id = index.id(), error = %format!("{e:#}"), "semantic retrieval misconfigured, falling back to lexical");
                } else {
                    tracing::warn!(id = index.id(), ?reason, error = %format!("{e:#}"), "semantic retrieval failed, falling back to lexical");
                }
                reason
            }
        };
        let passages = self.lexical(index, query, k).await?;
        Ok(Retrieval { passages, path: RetrievalPath::LexicalFallback { reason } })
    }

    async fn semantic(&self, index: &DocumentIndex, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let query_vec = self.store.embedder().embed(query).await?;
        self.store.vectors().nearest(index.area(), &query_vec, k).await
    }

    async fn lexical(&self, index: &DocumentIndex, query: &str, k: usize) -> Result<Vec<String>> {
        let store = index.chunk_store();
        let query = query.to_string();
        let ranked = tokio::task::spawn_blocking(move || -> Result<Option<Vec<SearchHit>>> {
            Ok(store.read()?.map(|chunks| rank(&chunks, &query, k)))
        })
        .await
        .map_err(|e| Error::Operation(format!("lexical ranking panicked: {e}")))??;
        match ranked {
            Some(hits) => Ok(hits.into_iter().map(|h| h.text).collect()),
            None => Err(self.store.not_found(index.id())),
        }
    }
}
