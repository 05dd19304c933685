//! Handlers for paper search and summarization tools.

use crate::{
    config::RequestDefaults,
    pipeline::{PipelineApi, SummarizeRequest},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

use super::{parse_arguments, pipeline_error};

/// Request payload for the `summarize-papers` tool.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SummarizePapersRequest {
    pub(crate) keyword: String,
    #[serde(default)]
    pub(crate) max_results: Option<i64>,
    #[serde(default)]
    pub(crate) max_length: Option<usize>,
}

/// Request payload for the `search-papers` tool.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SearchPapersRequest {
    pub(crate) keyword: String,
    #[serde(default)]
    pub(crate) max_results: Option<i64>,
}

/// Request payload for the `summarize-paper` tool.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SummarizePaperRequest {
    pub(crate) paper_id: String,
    #[serde(default)]
    pub(crate) max_length: Option<usize>,
}

/// Request payload for tools addressing one paper.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PaperRequest {
    pub(crate) paper_id: String,
}

/// Handle the `summarize-papers` tool: search a keyword and summarize every hit.
pub(crate) async fn handle_summarize_papers(
    pipeline: &dyn PipelineApi,
    defaults: RequestDefaults,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizePapersRequest = parse_arguments(arguments)?;
    let request = SummarizeRequest::new(
        &args.keyword,
        defaults.resolve_max_results(args.max_results),
        defaults.resolve_summary_length(args.max_length),
    )
    .map_err(|err| McpError::invalid_params(err.to_string(), None))?;

    let outcome = pipeline
        .summarize_keyword(request)
        .await
        .map_err(pipeline_error)?;
    tracing::info!(
        posts = outcome.results.len(),
        failed = outcome.failures.len(),
        cancelled = outcome.cancelled,
        "summarize-papers completed"
    );

    Ok(CallToolResult::structured(json!({
        "posts": outcome.results,
        "failed": outcome.failures,
        "cancelled": outcome.cancelled,
    })))
}

/// Handle the `search-papers` tool, returning metadata without summarizing.
pub(crate) async fn handle_search_papers(
    pipeline: &dyn PipelineApi,
    defaults: RequestDefaults,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SearchPapersRequest = parse_arguments(arguments)?;
    let papers = pipeline
        .search_documents(&args.keyword, defaults.resolve_max_results(args.max_results))
        .await
        .map_err(pipeline_error)?;

    Ok(CallToolResult::structured(json!({ "papers": papers })))
}

/// Handle the `summarize-paper` tool for a single identifier.
pub(crate) async fn handle_summarize_paper(
    pipeline: &dyn PipelineApi,
    defaults: RequestDefaults,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizePaperRequest = parse_arguments(arguments)?;
    let post = pipeline
        .fetch_and_summarize_one(
            &args.paper_id,
            defaults.resolve_summary_length(args.max_length),
        )
        .await
        .map_err(pipeline_error)?;

    Ok(CallToolResult::structured(json!(post)))
}

/// Handle the `paper-metadata` tool.
pub(crate) async fn handle_paper_metadata(
    pipeline: &dyn PipelineApi,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: PaperRequest = parse_arguments(arguments)?;
    let handle = pipeline
        .fetch_metadata(&args.paper_id)
        .await
        .map_err(pipeline_error)?;

    Ok(CallToolResult::structured(json!(handle)))
}

/// Handle the `paper-text` tool.
pub(crate) async fn handle_paper_text(
    pipeline: &dyn PipelineApi,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: PaperRequest = parse_arguments(arguments)?;
    let text = pipeline
        .fetch_and_extract(&args.paper_id)
        .await
        .map_err(pipeline_error)?;

    Ok(CallToolResult::structured(json!(text)))
}
