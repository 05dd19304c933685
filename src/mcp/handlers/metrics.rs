//! Handler for the metrics tool.

use crate::pipeline::PipelineApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning pipeline counters and cache statistics.
pub(crate) async fn handle_metrics(pipeline: &dyn PipelineApi) -> Result<CallToolResult, McpError> {
    let snapshot = pipeline.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "searchesRun": snapshot.searches_run,
        "documentsSummarized": snapshot.documents_summarized,
        "documentsFailed": snapshot.documents_failed,
        "batchesCancelled": snapshot.batches_cancelled,
        "caches": snapshot.caches,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handlers::test_support::StubPipeline;

    #[tokio::test]
    async fn metrics_payload_uses_camel_case_counters() {
        let result = handle_metrics(&StubPipeline::default())
            .await
            .expect("metrics");
        let payload = result.structured_content.expect("payload");
        assert_eq!(payload["documentsSummarized"], 3);
        assert_eq!(payload["caches"]["text"]["entries"], 0);
    }
}
