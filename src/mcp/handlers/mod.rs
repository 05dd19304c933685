//! Tool handlers for the MCP server.

use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::pipeline::PipelineError;

pub mod cache;
pub mod metrics;
pub mod papers;

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    let value = arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(JsonObject::new()));
    parse_arguments_value(value)
}

/// Deserialize arguments represented as a JSON value into the target type.
pub(crate) fn parse_arguments_value<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Map a pipeline failure onto an MCP error: caller mistakes are invalid params.
pub(crate) fn pipeline_error(error: PipelineError) -> McpError {
    match error {
        PipelineError::Input(inner) => McpError::invalid_params(inner.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory pipeline double shared by handler tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::arxiv::{DocumentHandle, DocumentStoreError};
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::{
        BatchOutcome, DocumentFailure, ExtractedText, FailureStage, PipelineApi, PipelineError,
        PipelineResult, SummarizeRequest, validate_document_id,
    };

    pub(crate) fn handle(id: &str) -> DocumentHandle {
        DocumentHandle {
            id: id.to_string(),
            title: format!("Paper {id}"),
            authors: vec!["Alan Turing".into()],
            published: "2024-02-01".into(),
            updated: "2024-02-01".into(),
            abstract_text: "Abstract".into(),
            source_url: format!("http://arxiv.org/abs/{id}"),
            pdf_url: Some(format!("http://arxiv.org/pdf/{id}")),
            doi: None,
        }
    }

    #[derive(Default)]
    pub(crate) struct StubPipeline {
        pub(crate) requests: Mutex<Vec<SummarizeRequest>>,
        pub(crate) clears: AtomicUsize,
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn summarize_keyword(
            &self,
            request: SummarizeRequest,
        ) -> Result<BatchOutcome, PipelineError> {
            let count = request.max_results();
            self.requests.lock().expect("requests").push(request);
            let mut outcome = BatchOutcome::default();
            for index in 0..count {
                let id = format!("2401.0000{index}");
                if index == 1 {
                    outcome.failures.push(DocumentFailure::new(
                        &id,
                        FailureStage::Summarization,
                        "rate limited",
                    ));
                } else {
                    outcome
                        .results
                        .push(PipelineResult::from_handle(&handle(&id), "short take"));
                }
            }
            Ok(outcome)
        }

        async fn search_documents(
            &self,
            keyword: &str,
            max_results: usize,
        ) -> Result<Vec<DocumentHandle>, PipelineError> {
            if keyword.trim().is_empty() {
                return Err(crate::pipeline::InputError::EmptyKeyword.into());
            }
            Ok((0..max_results)
                .map(|index| handle(&format!("2401.0000{index}")))
                .collect())
        }

        async fn fetch_and_summarize_one(
            &self,
            document_id: &str,
            length_budget: usize,
        ) -> Result<PipelineResult, PipelineError> {
            let document_id = validate_document_id(document_id)?;
            Ok(PipelineResult::from_handle(
                &handle(document_id),
                &format!("{length_budget} chars"),
            ))
        }

        async fn fetch_metadata(&self, document_id: &str) -> Result<DocumentHandle, PipelineError> {
            let document_id = validate_document_id(document_id)?;
            if document_id == "missing" {
                return Err(DocumentStoreError::NotFound(document_id.into()).into());
            }
            Ok(handle(document_id))
        }

        async fn fetch_and_extract(
            &self,
            document_id: &str,
        ) -> Result<ExtractedText, PipelineError> {
            let document_id = validate_document_id(document_id)?;
            Ok(ExtractedText {
                paper_id: document_id.to_string(),
                text: "Full body".into(),
            })
        }

        fn clear_caches(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 3,
                ..MetricsSnapshot::default()
            }
        }
    }
}
