use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use pdfqa_core::chunker::Chunker;
use pdfqa_core::config::Settings;
use pdfqa_core::error::{Error, Result};
use pdfqa_core::sanitize::sanitize;

use crate::answer::{completion_options, AnswerSynthesizer};
use crate::index_store::IndexStore;
use crate::pool::JobPool;
use crate::retriever::Retriever;
use crate::services::Services;
use crate::state::{AskOutcome, QueryState, QueryTrace};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReport {
    pub id: String,
    pub filename: String,
    pub chunks: usize,
    pub semantic: bool,
    pub mirrored: bool,
    pub local_copy: PathBuf,
}

/// A failed query together with the states it went through.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AskFailure {
    pub error: Error,
    pub trace: QueryTrace,
}

pub struct Pipeline {
    settings: Settings,
    services: Services,
    chunker: Chunker,
    index: Arc<IndexStore>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    pool: JobPool,
}

impl Pipeline {
    pub fn new(settings: Settings, services: Services) -> Self {
        let index = Arc::new(
            IndexStore::new(settings.index_root(), services.embedder.clone(), services.vectors.clone())
                .with_max_available(settings.retrieval.max_available),
        );
        Self {
            chunker: Chunker::new(settings.chunking),
            retriever: Retriever::new(index.clone()),
            synthesizer: AnswerSynthesizer::new(services.model.clone(), completion_options(&settings)),
            pool: JobPool::new(settings.server.max_concurrent_jobs),
            index,
            services,
            settings,
        }
    }

    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let services = Services::from_settings(&settings)?;
        Ok(Self::new(settings, services))
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn index(&self) -> &Arc<IndexStore> { &self.index }

    /// Sorted document identifiers. The directory scan runs on the blocking pool.
    pub async fn documents(&self) -> Result<Vec<String>> {
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || index.list())
            .await
            .map_err(|e| Error::Operation(format!("document listing panicked: {e}")))?
    }

    /// Keep a local copy, mirror it, then extract, chunk and index on the job pool.
    pub async fn index_upload(self: &Arc<Self>, filename: &str, bytes: Vec<u8>) -> Result<UploadReport> {
        validate_upload_name(filename)?;
        let id = sanitize(filename);

        let uploads_dir = self.settings.uploads_dir();
        tokio::fs::create_dir_all(&uploads_dir).await?;
        let local_copy = uploads_dir.join(&id);
        tokio::fs::write(&local_copy, &bytes).await?;

        let mirrored = match self.services.mirror.mirror(&bytes, &id).await {
            Ok(mirrored) => mirrored,
            Err(e) => {
                tracing::warn!(id = %id, error = %format!("{e:#}"), "upload mirroring failed");
                false
            }
        };

        let source_hash = blake3::hash(&bytes).to_hex().to_string();
        drop(bytes);
        let this = Arc::clone(self);
        let (job_id, job_filename, job_path) = (id.clone(), filename.to_string(), local_copy.clone());
        let report = self
            .pool
            .run(async move { this.build_from_file(job_id, job_filename, job_path, source_hash).await })
            .await??;

        Ok(UploadReport {
            id,
            filename: filename.to_string(),
            chunks: report.chunk_count,
            semantic: report.semantic,
            mirrored,
            local_copy,
        })
    }

    async fn build_from_file(&self, id: String, filename: String, path: PathBuf, source_hash: String) -> Result<crate::BuildReport> {
        let extractor = self.services.extractor.clone();
        let units = tokio::task::spawn_blocking(move || extractor.extract(&path, &filename))
            .await
            .map_err(|e| Error::Operation(format!("extraction panicked: {e}")))?
            .map_err(|e| match e.downcast::<Error>() {
                Ok(typed) => typed,
                Err(other) => Error::Extraction(format!("{other:#}")),
            })?;
        let chunks = self.chunker.chunk(&units);
        tracing::info!(id = %id, pages = units.len(), chunks = chunks.len(), "chunked document");
        self.index.build(&id, chunks, Some(source_hash)).await
    }

    /// Answer `question` about the document uploaded as `filename`, on the job pool.
    pub async fn ask(self: &Arc<Self>, filename: &str, question: &str) -> std::result::Result<AskOutcome, AskFailure> {
        let this = Arc::clone(self);
        let (filename, question) = (filename.to_string(), question.to_string());
        match self.pool.run(async move { this.ask_now(&filename, &question).await }).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let mut trace = QueryTrace::new();
                trace.advance(QueryState::Failed);
                Err(AskFailure { error, trace })
            }
        }
    }

    /// Run the query state machine on the current task.
    pub async fn ask_now(&self, filename: &str, question: &str) -> std::result::Result<AskOutcome, AskFailure> {
        let mut trace = QueryTrace::new();
        if filename.trim().is_empty() || question.trim().is_empty() {
            trace.advance(QueryState::Failed);
            return Err(AskFailure { error: Error::InvalidInput("filename and question are required".into()), trace });
        }
        let id = sanitize(filename);

        let doc = match self.index.open(&id) {
            Ok(doc) => doc,
            Err(error) => {
                trace.advance(QueryState::NotFound);
                return Err(AskFailure { error, trace });
            }
        };

        trace.advance(QueryState::Retrieve);
        let retrieval = match self.retriever.retrieve_in(&doc, question, self.settings.retrieval.top_k).await {
            Ok(retrieval) => retrieval,
            Err(error) => {
                if matches!(error, Error::DocumentNotFound { .. }) {
                    trace.advance(QueryState::NotFound);
                } else {
                    tracing::error!(id = %id, error = %error, "retrieval failed");
                    trace.advance(QueryState::Failed);
                }
                return Err(AskFailure { error, trace });
            }
        };
        trace.advance(QueryState::after_retrieval(&retrieval.path));

        trace.advance(QueryState::Synthesize);
        match self.synthesizer.answer(&retrieval.passages, question).await {
            Ok(answer) => {
                trace.advance(QueryState::Answered);
                Ok(AskOutcome { answer, retrieval_path: retrieval.path, trace })
            }
            Err(error) => {
                tracing::error!(id = %id, error = %error, "answer synthesis failed");
                trace.advance(QueryState::ModelError);
                Err(AskFailure { error, trace })
            }
        }
    }
}

fn validate_upload_name(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(Error::InvalidInput("file has no name".into()));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(Error::InvalidInput("only PDF files (.pdf) are accepted".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_names() {
        assert!(validate_upload_name("report.PDF").is_ok());
        assert!(validate_upload_name("").is_err());
        assert!(validate_upload_name("notes.txt").is_err());
        assert!(validate_upload_name("pdf").is_err());
    }
}
