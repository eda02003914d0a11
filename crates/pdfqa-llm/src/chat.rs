use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pdfqa_core::error::ServiceError;
use pdfqa_core::traits::{CompletionOptions, LanguageModel};

use pdfqa_embed::ollama::{status_error, transport_error};

/// Non-streaming chat completion against `POST /api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    num_ctx: u32,
    keep_alive: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    keep_alive: &'a str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaChat {
    pub fn new(base_url: &str, model: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            num_ctx: 2048,
            keep_alive: "5m".to_string(),
        })
    }

    pub fn with_context_window(mut self, num_ctx: u32) -> Self {
        self.num_ctx = num_ctx;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: &str) -> Self {
        self.keep_alive = keep_alive.to_string();
        self
    }

    fn chat_url(&self) -> String { format!("{}/api/chat", self.base_url) }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    fn model_id(&self) -> &str { &self.model }

    async fn complete(&self, prompt: &str, opts: &CompletionOptions) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            stream: false,
            keep_alive: &self.keep_alive,
            options: ChatOptions { temperature: opts.temperature, num_predict: opts.max_tokens, num_ctx: self.num_ctx },
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "ollama chat request");
        let response = self
            .client
            .post(self.chat_url())
            .timeout(opts.timeout)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "ollama chat failed");
            return Err(status_error(status, &body).into());
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Corrupt(format!("undecodable chat response: {e}")))?;
        Ok(result.message.content)
    }
}
