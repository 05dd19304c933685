use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{
    SummarizationError, Summarizer, non_empty_summary,
    prompt::{SYSTEM_PROMPT, build_user_prompt},
};

/// Summarizer backed by a local Ollama runtime.
pub struct OllamaSummarizer {
    http: Client,
    base_url: String,
    model: String,
    max_input_tokens: usize,
}

impl OllamaSummarizer {
    /// Create a client posting to `{base_url}/api/generate`.
    pub fn new(http: Client, base_url: String, model: String, max_input_tokens: usize) -> Self {
        Self {
            http,
            base_url,
            model,
            max_input_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
    done: bool,
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, SummarizationError> {
        let payload = json!({
            "model": self.model,
            "system": SYSTEM_PROMPT,
            "prompt": build_user_prompt(text, max_length, self.max_input_tokens),
            "stream": false,
            "options": {
                "temperature": 0.3,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        non_empty_summary(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> OllamaSummarizer {
        OllamaSummarizer::new(
            Client::builder()
                .user_agent("arxiv-sage-test")
                .build()
                .expect("client"),
            server.base_url(),
            "llama3".into(),
            1_000,
        )
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains("llama3");
                then.status(200).json_body(json!({
                    "response": "Summary text",
                    "done": true
                }));
            })
            .await;

        let summary = client_for(&server)
            .summarize("Paper body", 500)
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_rejects_incomplete_responses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = client_for(&server)
            .summarize("Paper body", 500)
            .await
            .expect_err("incomplete");

        assert!(matches!(error, SummarizationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn ollama_client_handles_missing_endpoint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404);
            })
            .await;

        let error = client_for(&server)
            .summarize("Paper body", 500)
            .await
            .expect_err("404");

        assert!(matches!(error, SummarizationError::ProviderUnavailable(_)));
    }
}
