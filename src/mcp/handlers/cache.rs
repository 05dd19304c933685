//! Handler for the cache maintenance tool.

use crate::pipeline::PipelineApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `clear-caches` tool.
pub(crate) async fn handle_clear_caches(
    pipeline: &dyn PipelineApi,
) -> Result<CallToolResult, McpError> {
    pipeline.clear_caches();
    Ok(CallToolResult::structured(json!({ "status": "ok" })))
}
