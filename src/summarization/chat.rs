use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{
    SummarizationError, Summarizer, non_empty_summary,
    prompt::{SYSTEM_PROMPT, build_user_prompt},
};

/// Client for OpenAI-compatible `chat/completions` endpoints such as DeepSeek.
pub struct ChatCompletionsSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_input_tokens: usize,
}

impl ChatCompletionsSummarizer {
    /// Create a client posting to `{base_url}/chat/completions`.
    pub fn new(
        http: Client,
        base_url: String,
        api_key: String,
        model: String,
        max_input_tokens: usize,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
            max_input_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Summarizer for ChatCompletionsSummarizer {
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, SummarizationError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": build_user_prompt(text, max_length, self.max_input_tokens),
                },
            ],
            "stream": false,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(SummarizationError::ProviderUnavailable(
                "provider rejected the API key".into(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|error| {
            SummarizationError::InvalidResponse(format!(
                "failed to decode chat completion: {error}"
            ))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        non_empty_summary(content)
    }
}
