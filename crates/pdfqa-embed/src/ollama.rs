use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use pdfqa_core::error::ServiceError;
use pdfqa_core::traits::Embedder;

/// Embeddings from a local Ollama server (`POST /api/embed`).
///
/// Failures are reported as [`ServiceError`] inside the `anyhow::Error` so the
/// retriever can tell an unreachable server from a missing model.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    id: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            id: format!("ollama:{model}"),
        })
    }

    fn embed_url(&self) -> String { format!("{}/api/embed", self.base_url) }
}

/// Map a non-success Ollama response to a service error class. Shared by
/// every Ollama client in the workspace.
pub fn status_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(body).map(|b| b.error).unwrap_or_else(|_| body.to_string());
    match status.as_u16() {
        400 | 404 => ServiceError::Misconfigured(format!("Ollama returned {status}: {message}")),
        _ => ServiceError::Unavailable(format!("Ollama returned {status}: {message}")),
    }
}

pub fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_builder() { ServiceError::Misconfigured(e.to_string()) } else { ServiceError::Unavailable(e.to_string()) }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        debug!(count = texts.len(), model = %self.model, "embedding batch with ollama");
        let request = EmbedRequest { model: &self.model, input: texts };
        let response = self.client.post(self.embed_url()).json(&request).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "ollama embedding failed");
            return Err(status_error(status, &body).into());
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Corrupt(format!("undecodable embedding response: {e}")))?;
        if result.embeddings.len() != texts.len() {
            return Err(ServiceError::Corrupt(format!(
                "got {} embeddings for {} inputs",
                result.embeddings.len(),
                texts.len()
            ))
            .into());
        }
        Ok(result.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_and_id() {
        let e = OllamaEmbedder::new("http://localhost:11434/", "nomic-embed-text", Duration::from_secs(1)).unwrap();
        assert_eq!(e.embed_url(), "http://localhost:11434/api/embed");
        assert_eq!(e.embedder_id(), "ollama:nomic-embed-text");
    }

    #[test]
    fn missing_model_is_misconfiguration() {
        let err = status_error(reqwest::StatusCode::NOT_FOUND, r#"{"error":"model \"nope\" not found"}"#);
        assert!(matches!(err, ServiceError::Misconfigured(ref m) if m.contains("not found")));
        let err = status_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "busy");
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }
}
