//! Model management: list installed models and pull new ones.
use anyhow::{anyhow, Result};
use futures::StreamExt;
use serde::Deserialize;
use std::time::{Duration, Instant};

use pdfqa_embed::ollama::{status_error, transport_error};

pub const DEFAULT_PULL_MODELS: [&str; 2] = ["qwen2.5:0.5b", "nomic-embed-text"];
pub const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OllamaAdmin {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullLine {
    error: Option<String>,
}

/// Lets through at most one progress line per interval.
#[derive(Debug)]
pub struct PullThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PullThrottle {
    pub fn new(interval: Duration) -> Self { Self { interval, last: None } }

    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => { self.last = Some(now); true }
        }
    }
}

impl OllamaAdmin {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self { client: reqwest::Client::builder().build()?, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    /// Names of the locally installed models.
    pub async fn list_tags(&self, timeout: Duration) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Stream `POST /api/pull`, handing each admitted progress line to `on_line`.
    /// Returns the number of lines received.
    pub async fn pull(&self, model: &str, throttle: &mut PullThrottle, mut on_line: impl FnMut(&str)) -> Result<usize> {
        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&serde_json::json!({ "name": model, "stream": true }))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut received = 0usize;
        while let Some(bytes) = stream.next().await {
            buffer.extend_from_slice(&bytes?);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                received += handle_line(&line, throttle, &mut on_line)?;
            }
        }
        received += handle_line(&buffer, throttle, &mut on_line)?;
        tracing::info!(model, lines = received, "pull finished");
        Ok(received)
    }
}

fn handle_line(raw: &[u8], throttle: &mut PullThrottle, on_line: &mut impl FnMut(&str)) -> Result<usize> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() { return Ok(0); }
    if let Ok(PullLine { error: Some(error) }) = serde_json::from_str::<PullLine>(line) {
        return Err(anyhow!("pull failed: {}", error));
    }
    if throttle.admit(Instant::now()) { on_line(line); }
    Ok(1)
}
