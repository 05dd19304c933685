use std::sync::Arc;

use arxiv_sage::{
    arxiv::{DocumentHandle, DocumentStore, DocumentStoreError},
    extraction::{ExtractionError, TextExtractor},
    mcp::{ArxivSageMcpServer, SettingsSnapshot},
    pipeline::{PipelineSettings, SummaryPipeline},
    summarization::{SummarizationError, Summarizer},
};
use async_trait::async_trait;
use rmcp::{
    handler::client::ClientHandler,
    model::{self, CallToolRequestParam, ClientInfo, PaginatedRequestParam, ReadResourceRequestParam},
    service::{RoleClient, RoleServer, RunningService, Service, serve_directly},
    transport::async_rw::AsyncRwTransport,
};
use serde_json::json;
use tokio::io::split;

struct FixedStore;

fn handle(id: &str) -> DocumentHandle {
    DocumentHandle {
        id: id.to_string(),
        title: format!("Paper {id}"),
        authors: vec!["Ada Lovelace".into()],
        published: "2024-01-02".into(),
        updated: "2024-01-02".into(),
        abstract_text: "Abstract".into(),
        source_url: format!("http://arxiv.org/abs/{id}"),
        pdf_url: Some(format!("http://arxiv.org/pdf/{id}")),
        doi: None,
    }
}

#[async_trait]
impl DocumentStore for FixedStore {
    async fn search(
        &self,
        _keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, DocumentStoreError> {
        Ok(["2401.00001v1", "2401.00002v1", "2401.00003v1"]
            .into_iter()
            .take(max_results)
            .map(handle)
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<DocumentHandle, DocumentStoreError> {
        if id.starts_with("2401.") {
            Ok(handle(id))
        } else {
            Err(DocumentStoreError::NotFound(id.to_string()))
        }
    }
}

struct EchoExtractor;

#[async_trait]
impl TextExtractor for EchoExtractor {
    async fn extract(&self, document_id: &str) -> Result<String, ExtractionError> {
        if document_id.ends_with("2v1") {
            return Err(ExtractionError::NotFound(document_id.to_string()));
        }
        Ok(format!("Body of {document_id}"))
    }
}

struct PrefixSummarizer;

#[async_trait]
impl Summarizer for PrefixSummarizer {
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, SummarizationError> {
        Ok(format!("TL;DR {text}").chars().take(max_length).collect())
    }
}

#[derive(Clone, Default)]
struct DummyClientHandler;

impl ClientHandler for DummyClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

struct TestHarness {
    service: RunningService<RoleClient, DummyClientHandler>,
    server: RunningService<RoleServer, ArxivSageMcpServer>,
}

impl TestHarness {
    fn new() -> Self {
        let pipeline = SummaryPipeline::new(
            Arc::new(FixedStore),
            Arc::new(EchoExtractor),
            Arc::new(PrefixSummarizer),
            PipelineSettings::default(),
        );
        let settings = SettingsSnapshot {
            provider: "deepseek".into(),
            model: "deepseek-chat".into(),
            workers: 2,
            request_timeout_secs: 30,
            default_max_results: 3,
            max_results_limit: 10,
            default_summary_length: 200,
        };
        let server = ArxivSageMcpServer::new(Arc::new(pipeline), settings);

        let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
        let (client_read, client_write) = split(client_stream);
        let (server_read, server_write) = split(server_stream);

        let client_transport = AsyncRwTransport::new_client(client_read, client_write);
        let server_transport = AsyncRwTransport::new_server(server_read, server_write);

        let server_info = server.get_info();
        let client_handler = DummyClientHandler;
        let client_info = ClientHandler::get_info(&client_handler);

        let server =
            serve_directly::<RoleServer, _, _, _, _>(server, server_transport, Some(client_info));
        let service = serve_directly::<RoleClient, _, _, _, _>(
            client_handler,
            client_transport,
            Some(server_info),
        );

        Self { service, server }
    }

    async fn shutdown(self) {
        let Self { service, server } = self;
        let _ = service.cancel().await;
        let _ = server.cancel().await;
    }
}

fn arguments(value: serde_json::Value) -> Option<model::JsonObject> {
    value.as_object().cloned()
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let harness = TestHarness::new();
    let service = &harness.service;

    let info = service
        .peer_info()
        .expect("server info should be initialized");
    assert_eq!(info.server_info.name, "arxiv-sage");
    assert!(info.capabilities.tools.is_some());

    let tools_result = service
        .list_tools(Some(PaginatedRequestParam { cursor: None }))
        .await
        .expect("list_tools");
    let names: Vec<_> = tools_result
        .tools
        .iter()
        .map(|tool| tool.name.as_ref())
        .collect();

    for expected in [
        "summarize-papers",
        "search-papers",
        "summarize-paper",
        "paper-metadata",
        "paper-text",
        "clear-caches",
        "metrics",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn summarize_papers_reports_posts_and_failures() {
    let harness = TestHarness::new();
    let service = &harness.service;

    let response = service
        .call_tool(CallToolRequestParam {
            name: "summarize-papers".into(),
            arguments: arguments(json!({ "keyword": "all:graphs", "max_length": 40 })),
        })
        .await
        .expect("summarize-papers call");

    assert_eq!(response.is_error, Some(false));
    let payload = response.structured_content.expect("structured payload");
    let posts = payload["posts"].as_array().expect("posts");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["paper_id"], "2401.00001v1");
    assert_eq!(posts[1]["paper_id"], "2401.00003v1");
    assert_eq!(posts[0]["summary"], "TL;DR Body of 2401.00001v1");
    assert_eq!(payload["failed"][0]["document_id"], "2401.00002v1");
    assert_eq!(payload["failed"][0]["stage"], "extraction");
    assert_eq!(payload["cancelled"], false);

    let metrics_response = service
        .call_tool(CallToolRequestParam {
            name: "metrics".into(),
            arguments: arguments(json!({})),
        })
        .await
        .expect("metrics tool call");
    let metrics = metrics_response
        .structured_content
        .expect("structured metrics payload");
    assert_eq!(metrics["searchesRun"], 1);
    assert_eq!(metrics["documentsSummarized"], 2);
    assert_eq!(metrics["documentsFailed"], 1);
    assert_eq!(metrics["caches"]["text"]["entries"], 2);

    harness.shutdown().await;
}

#[tokio::test]
async fn single_paper_tools_share_the_pipeline() {
    let harness = TestHarness::new();
    let service = &harness.service;

    let post = service
        .call_tool(CallToolRequestParam {
            name: "summarize-paper".into(),
            arguments: arguments(json!({ "paper_id": "2401.00003v1" })),
        })
        .await
        .expect("summarize-paper call")
        .structured_content
        .expect("post payload");
    assert_eq!(post["title"], "Paper 2401.00003v1");
    assert_eq!(post["summary"], "TL;DR Body of 2401.00003v1");

    let text = service
        .call_tool(CallToolRequestParam {
            name: "paper-text".into(),
            arguments: arguments(json!({ "paper_id": "2401.00003v1" })),
        })
        .await
        .expect("paper-text call")
        .structured_content
        .expect("text payload");
    assert_eq!(text["text"], "Body of 2401.00003v1");

    let settings = service
        .read_resource(ReadResourceRequestParam {
            uri: "mcp://settings".into(),
        })
        .await
        .expect("settings resource");
    assert_eq!(settings.contents.len(), 1);

    harness.shutdown().await;
}

#[tokio::test]
async fn invalid_payload_returns_error() {
    let harness = TestHarness::new();
    let service = &harness.service;

    let err = service
        .call_tool(CallToolRequestParam {
            name: "summarize-papers".into(),
            arguments: arguments(json!({ "keyword": "   " })),
        })
        .await
        .expect_err("blank keyword should fail");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    harness.shutdown().await;
}
