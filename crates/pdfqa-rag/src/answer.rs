use std::sync::Arc;
use std::time::Duration;

use pdfqa_core::config::Settings;
use pdfqa_core::error::{Error, Result};
use pdfqa_core::traits::{CompletionOptions, LanguageModel};

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Prompt that restricts the model to the supplied passages.
pub fn build_prompt(context: &[String], question: &str) -> String {
    format!(
        "You are an assistant that answers questions using ONLY the context provided. \
         If the context is not sufficient, say that the information was not found in the document.\n\n\
         Question: {question}\n\n\
         Context:\n{}",
        context.join(CONTEXT_SEPARATOR)
    )
}

pub fn completion_options(settings: &Settings) -> CompletionOptions {
    CompletionOptions {
        max_tokens: settings.llm.num_predict,
        temperature: settings.llm.temperature,
        timeout: Duration::from_secs(settings.ollama.chat_timeout_secs),
    }
}

pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    options: CompletionOptions,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, options: CompletionOptions) -> Self { Self { model, options } }

    /// One completion call, no retry. The model's text is returned verbatim.
    pub async fn answer(&self, context: &[String], question: &str) -> Result<String> {
        let prompt = build_prompt(context, question);
        tracing::debug!(model = self.model.model_id(), passages = context.len(), "synthesizing answer");
        self.model
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| Error::Model(format!("{}: {e:#}", self.model.model_id())))
    }
}
