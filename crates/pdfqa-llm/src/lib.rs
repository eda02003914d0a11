//! Language-model completion and model management over the Ollama HTTP API.
use std::sync::Arc;

use pdfqa_core::config::Settings;
use pdfqa_core::traits::LanguageModel;

pub mod chat;
pub mod pull;

pub use chat::OllamaChat;
pub use pull::{OllamaAdmin, PullThrottle};

pub fn get_default_model(settings: &Settings) -> anyhow::Result<Arc<dyn LanguageModel>> {
    let chat = OllamaChat::new(&settings.ollama.base_url, &settings.llm.chat_model)?
        .with_context_window(settings.llm.num_ctx)
        .with_keep_alive(&settings.llm.keep_alive);
    tracing::info!(model = %settings.llm.chat_model, url = %settings.ollama.base_url, "using ollama chat model");
    Ok(Arc::new(chat))
}
