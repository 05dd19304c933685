//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json, usage_payload},
        handlers::{
            cache::handle_clear_caches,
            metrics::handle_metrics,
            papers::{
                handle_paper_metadata, handle_paper_text, handle_search_papers,
                handle_summarize_paper, handle_summarize_papers,
            },
        },
        registry, schemas,
    },
    pipeline::PipelineApi,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";
const USAGE_URI: &str = "mcp://usage";

/// MCP server implementation exposing arXiv Sage operations.
#[derive(Clone)]
pub struct ArxivSageMcpServer {
    pipeline: Arc<dyn PipelineApi>,
    settings: Arc<SettingsSnapshot>,
    registry: Arc<registry::Registry>,
}

impl ArxivSageMcpServer {
    /// Create a new MCP server on top of the supplied pipeline.
    pub fn new(pipeline: Arc<dyn PipelineApi>, settings: SettingsSnapshot) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_resource(USAGE_URI, resource_usage);

        registry.register_tool("summarize-papers", tool_summarize_papers);
        registry.register_tool("search-papers", tool_search_papers);
        registry.register_tool("summarize-paper", tool_summarize_paper);
        registry.register_tool("paper-metadata", tool_paper_metadata);
        registry.register_tool("paper-text", tool_paper_text);
        registry.register_tool("clear-caches", tool_clear_caches);
        registry.register_tool("metrics", tool_metrics);
        tracing::debug!(
            tools = ?registry.tool_names().collect::<Vec<_>>(),
            resources = ?registry.resource_uris().collect::<Vec<_>>(),
            "MCP handlers registered"
        );

        Self {
            pipeline,
            settings: Arc::new(settings),
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        let paper_schema = Arc::new(schemas::paper_id_input_schema());
        let empty_schema = Arc::new(schemas::empty_object_schema());
        vec![
            Tool {
                name: Cow::Borrowed("summarize-papers"),
                title: Some("Summarize Papers".to_string()),
                description: Some(Cow::Borrowed(
                    "Search arXiv for a keyword and return a short, post-style summary of each paper. Failed papers are listed separately.",
                )),
                input_schema: Arc::new(schemas::summarize_papers_input_schema(&self.settings)),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Papers")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("search-papers"),
                title: Some("Search Papers".to_string()),
                description: Some(Cow::Borrowed(
                    "List arXiv papers matching a keyword, newest first, without summarizing them.",
                )),
                input_schema: Arc::new(schemas::search_papers_input_schema(&self.settings)),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Search Papers")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("summarize-paper"),
                title: Some("Summarize Paper".to_string()),
                description: Some(Cow::Borrowed(
                    "Summarize one arXiv paper by identifier.",
                )),
                input_schema: Arc::new(schemas::summarize_paper_input_schema(&self.settings)),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Paper")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("paper-metadata"),
                title: Some("Paper Metadata".to_string()),
                description: Some(Cow::Borrowed(
                    "Fetch title, authors, dates, and links for one arXiv paper.",
                )),
                input_schema: paper_schema.clone(),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Paper Metadata")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("paper-text"),
                title: Some("Paper Text".to_string()),
                description: Some(Cow::Borrowed(
                    "Download a paper's PDF and return its extracted plain text.",
                )),
                input_schema: paper_schema,
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Paper Text")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("clear-caches"),
                title: Some("Clear Caches".to_string()),
                description: Some(Cow::Borrowed(
                    "Drop cached searches, texts, and summaries so the next request fetches fresh data.",
                )),
                input_schema: empty_schema.clone(),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Clear Caches")
                        .destructive(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check search, summary, and cache counters at a glance.",
                )),
                input_schema: empty_schema,
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Summarization backend, worker count, and request defaults".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some("Recommended tool flow: search-papers then summarize-paper, or summarize-papers for a digest.".into());

        vec![settings.no_annotation(), usage.no_annotation()]
    }
}

fn resource_settings(
    server: &ArxivSageMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let settings = server.settings.clone();
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(settings.as_ref(), SETTINGS_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &ArxivSageMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage_payload(), USAGE_URI),
            )],
        })
    })
}

fn tool_summarize_papers(
    server: &ArxivSageMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    let defaults = server.settings.request_defaults();
    Box::pin(async move { handle_summarize_papers(pipeline.as_ref(), defaults, request.arguments).await })
}

fn tool_search_papers(
    server: &ArxivSageMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    let defaults = server.settings.request_defaults();
    Box::pin(async move { handle_search_papers(pipeline.as_ref(), defaults, request.arguments).await })
}

fn tool_summarize_paper(
    server: &ArxivSageMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    let defaults = server.settings.request_defaults();
    Box::pin(async move { handle_summarize_paper(pipeline.as_ref(), defaults, request.arguments).await })
}

fn tool_paper_metadata(
    server: &ArxivSageMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_paper_metadata(pipeline.as_ref(), request.arguments).await })
}

fn tool_paper_text(
    server: &ArxivSageMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_paper_text(pipeline.as_ref(), request.arguments).await })
}

fn tool_clear_caches(
    server: &ArxivSageMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_clear_caches(pipeline.as_ref()).await })
}

fn tool_metrics(
    server: &ArxivSageMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let pipeline = server.pipeline.clone();
    Box::pin(async move { handle_metrics(pipeline.as_ref()).await })
}

impl ServerHandler for ArxivSageMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "arxiv-sage".to_string();
        implementation.title = Some("arXiv Sage MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to find arXiv papers by keyword and read short summaries of them. Search first when exploring; summarize a keyword for a digest. Results are cached until clear-caches is called.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resource(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tool(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
