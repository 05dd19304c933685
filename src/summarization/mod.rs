//! Abstractive summarization of paper text through hosted or local language models.
//!
//! Two backends are provided: an OpenAI-compatible chat completions client (DeepSeek by
//! default) and an Ollama client issuing requests directly to the local runtime. Both share the
//! prompt built in [`prompt`], which truncates the paper to a token budget before sending it.

mod chat;
mod ollama;
pub(crate) mod prompt;

pub use chat::ChatCompletionsSummarizer;
pub use ollama::OllamaSummarizer;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{Config, SummarizationProvider};

const DEFAULT_DEEPSEEK_URL: &str = "https://api.deepseek.com";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// Provider was misconfigured or unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Provider answered without any summary text.
    #[error("Provider returned an empty summary")]
    EmptySummary,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense `text` into a summary of at most `max_length` characters.
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, SummarizationError>;
}

/// Build the summarizer selected by configuration.
pub fn build_summarizer(config: &Config) -> Result<Arc<dyn Summarizer>, SummarizationError> {
    let http = Client::builder()
        .user_agent("arxiv-sage/summary")
        .timeout(config.http_timeout())
        .build()
        .map_err(|error| SummarizationError::ProviderUnavailable(error.to_string()))?;

    let summarizer: Arc<dyn Summarizer> = match config.summarization_provider {
        SummarizationProvider::DeepSeek | SummarizationProvider::OpenAI => {
            let default_url = if config.summarization_provider == SummarizationProvider::DeepSeek
            {
                DEFAULT_DEEPSEEK_URL
            } else {
                DEFAULT_OPENAI_URL
            };
            let api_key = config.summarization_api_key.clone().ok_or_else(|| {
                SummarizationError::ProviderUnavailable(format!(
                    "{} requires an API key",
                    config.summarization_provider.label()
                ))
            })?;
            Arc::new(ChatCompletionsSummarizer::new(
                http,
                base_url_or(config, default_url),
                api_key,
                config.summarization_model.clone(),
                config.summarization_max_input_tokens,
            ))
        }
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizer::new(
            http,
            base_url_or(config, DEFAULT_OLLAMA_URL),
            config.summarization_model.clone(),
            config.summarization_max_input_tokens,
        )),
    };

    tracing::info!(
        provider = config.summarization_provider.label(),
        model = %config.summarization_model,
        "Summarization client initialized"
    );
    Ok(summarizer)
}

fn base_url_or(config: &Config, default_url: &str) -> String {
    config
        .summarization_api_url
        .clone()
        .unwrap_or_else(|| default_url.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Treat blank provider output as a failure rather than a valid summary.
pub(crate) fn non_empty_summary(content: Option<String>) -> Result<String, SummarizationError> {
    content
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(SummarizationError::EmptySummary)
}
