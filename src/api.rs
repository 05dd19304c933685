//! HTTP surface for arXiv Sage.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Liveness greeting.
//! - `POST /api/keyword/summarize` – Search arXiv for a keyword and summarize every hit. Returns
//!   `{ "posts": [...], "failed": [...], "cancelled": bool }`.
//! - `GET /api/papers/search` – Search arXiv without summarizing.
//! - `GET /api/papers/:id` – Metadata for one paper.
//! - `GET /api/papers/:id/text` – Extracted full text for one paper.
//! - `POST /api/papers/:id/summarize` – Summarize one paper.
//! - `POST /api/cache/clear` – Drop every cached search, text, and summary.
//! - `GET /api/metrics` – Pipeline counters and cache statistics.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Old-style identifiers containing a slash (`hep-th/9901001`) must be percent-encoded in the
//! path. The HTTP surface shares the same pipeline with the MCP server and the CLI, so behavior
//! is identical across interfaces.

use crate::arxiv::{DocumentHandle, DocumentStoreError};
use crate::config::RequestDefaults;
use crate::extraction::ExtractionError;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{
    DocumentFailure, ExtractedText, PipelineApi, PipelineError, PipelineResult, SummarizeRequest,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Shared router state: the pipeline plus request defaults.
struct ApiState<S> {
    service: Arc<S>,
    defaults: RequestDefaults,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            defaults: self.defaults,
        }
    }
}

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>, defaults: RequestDefaults) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/api/keyword/summarize", post(summarize_keyword::<S>))
        .route("/api/papers/search", get(search_papers::<S>))
        .route("/api/papers/:id", get(paper_metadata::<S>))
        .route("/api/papers/:id/text", get(paper_text::<S>))
        .route("/api/papers/:id/summarize", post(summarize_paper::<S>))
        .route("/api/cache/clear", post(clear_caches::<S>))
        .route("/api/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(ApiState { service, defaults })
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the arXiv Sage API!" }))
}

/// Request body for `POST /api/keyword/summarize`.
#[derive(Deserialize)]
struct KeywordRequest {
    /// arXiv search expression, e.g. `cat:cs.LG` or `all:transformers`.
    keyword: String,
    /// Number of papers to process; negative values are treated as zero.
    #[serde(default)]
    max_results: Option<i64>,
    /// Summary length budget in characters.
    #[serde(default)]
    max_length: Option<usize>,
}

/// Response body for `POST /api/keyword/summarize`.
#[derive(Serialize)]
struct KeywordResponse {
    posts: Vec<PipelineResult>,
    failed: Vec<DocumentFailure>,
    cancelled: bool,
}

/// Summarize the papers matching a keyword.
async fn summarize_keyword<S>(
    State(state): State<ApiState<S>>,
    Json(request): Json<KeywordRequest>,
) -> Result<Json<KeywordResponse>, AppError>
where
    S: PipelineApi,
{
    let max_results = state.defaults.resolve_max_results(request.max_results);
    let max_length = state.defaults.resolve_summary_length(request.max_length);
    let request = SummarizeRequest::new(&request.keyword, max_results, max_length)
        .map_err(PipelineError::from)?;

    let outcome = state.service.summarize_keyword(request).await?;
    tracing::info!(
        posts = outcome.results.len(),
        failed = outcome.failures.len(),
        cancelled = outcome.cancelled,
        "Keyword request completed"
    );
    Ok(Json(KeywordResponse {
        posts: outcome.results,
        failed: outcome.failures,
        cancelled: outcome.cancelled,
    }))
}

/// Query string for `GET /api/papers/search`.
#[derive(Deserialize)]
struct SearchQuery {
    keyword: String,
    #[serde(default)]
    max_results: Option<i64>,
}

#[derive(Serialize)]
struct SearchResponse {
    papers: Vec<DocumentHandle>,
}

async fn search_papers<S>(
    State(state): State<ApiState<S>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError>
where
    S: PipelineApi,
{
    let max_results = state.defaults.resolve_max_results(query.max_results);
    let papers = state
        .service
        .search_documents(&query.keyword, max_results)
        .await?;
    Ok(Json(SearchResponse { papers }))
}

async fn paper_metadata<S>(
    State(state): State<ApiState<S>>,
    Path(paper_id): Path<String>,
) -> Result<Json<DocumentHandle>, AppError>
where
    S: PipelineApi,
{
    Ok(Json(state.service.fetch_metadata(&paper_id).await?))
}

async fn paper_text<S>(
    State(state): State<ApiState<S>>,
    Path(paper_id): Path<String>,
) -> Result<Json<ExtractedText>, AppError>
where
    S: PipelineApi,
{
    Ok(Json(state.service.fetch_and_extract(&paper_id).await?))
}

/// Optional body for `POST /api/papers/:id/summarize`.
#[derive(Deserialize, Default)]
struct PaperSummaryRequest {
    #[serde(default)]
    max_length: Option<usize>,
}

async fn summarize_paper<S>(
    State(state): State<ApiState<S>>,
    Path(paper_id): Path<String>,
    request: Option<Json<PaperSummaryRequest>>,
) -> Result<Json<PipelineResult>, AppError>
where
    S: PipelineApi,
{
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let max_length = state.defaults.resolve_summary_length(request.max_length);
    let result = state
        .service
        .fetch_and_summarize_one(&paper_id, max_length)
        .await?;
    Ok(Json(result))
}

async fn clear_caches<S>(State(state): State<ApiState<S>>) -> Json<serde_json::Value>
where
    S: PipelineApi,
{
    state.service.clear_caches();
    Json(json!({ "status": "ok" }))
}

/// Return pipeline counters together with per-cache sizes and hit rates.
async fn get_metrics<S>(State(state): State<ApiState<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(state.service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize_keyword",
                method: "POST",
                path: "/api/keyword/summarize",
                description: "Search arXiv for a keyword and summarize each paper. Response returns { \"posts\": [...], \"failed\": [...], \"cancelled\": bool }.",
                request_example: Some(json!({
                    "keyword": "cat:cs.LG AND all:diffusion",
                    "max_results": 5,
                    "max_length": 500
                })),
            },
            CommandDescriptor {
                name: "search_papers",
                method: "GET",
                path: "/api/papers/search?keyword=...&max_results=...",
                description: "Return paper metadata matching a keyword without summarizing.",
                request_example: None,
            },
            CommandDescriptor {
                name: "paper_metadata",
                method: "GET",
                path: "/api/papers/:id",
                description: "Return metadata for a single arXiv paper.",
                request_example: None,
            },
            CommandDescriptor {
                name: "paper_text",
                method: "GET",
                path: "/api/papers/:id/text",
                description: "Download a paper's PDF and return its extracted text.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize_paper",
                method: "POST",
                path: "/api/papers/:id/summarize",
                description: "Summarize a single arXiv paper.",
                request_example: Some(json!({ "max_length": 300 })),
            },
            CommandDescriptor {
                name: "clear_caches",
                method: "POST",
                path: "/api/cache/clear",
                description: "Drop cached searches, extracted texts, and summaries.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/api/metrics",
                description: "Return pipeline counters and cache statistics.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Input(_) => StatusCode::BAD_REQUEST,
            PipelineError::Lookup(DocumentStoreError::NotFound(_))
            | PipelineError::Extraction(ExtractionError::NotFound(_)) => StatusCode::NOT_FOUND,
            PipelineError::Lookup(_)
            | PipelineError::Extraction(_)
            | PipelineError::Summarization(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::arxiv::{DocumentHandle, DocumentStoreError};
    use crate::config::RequestDefaults;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::{
        BatchOutcome, DocumentFailure, ExtractedText, FailureStage, PipelineApi, PipelineError,
        PipelineResult, SummarizeRequest, validate_document_id,
    };
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_summarize_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize_keyword")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert_eq!(summarize.path, "/api/keyword/summarize");
        assert!(commands.len() >= 5);
    }

    #[tokio::test]
    async fn root_greets() {
        let (status, body) = send(app(StubPipeline::default()), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to the arXiv Sage API!");
    }

    #[tokio::test]
    async fn keyword_route_applies_defaults_and_returns_posts() {
        let service = Arc::new(StubPipeline::default());
        let app = create_router(service.clone(), RequestDefaults::default());

        let (status, body) = send(
            app,
            Method::POST,
            "/api/keyword/summarize",
            Some(json!({ "keyword": "  diffusion  " })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"][0]["paper_id"], "2401.00001");
        assert_eq!(body["failed"][0]["stage"], "extraction");
        assert_eq!(body["cancelled"], false);

        let requests = service.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].keyword(), "diffusion");
        assert_eq!(requests[0].max_results(), 10);
        assert_eq!(requests[0].length_budget(), 500);
    }

    #[tokio::test]
    async fn keyword_route_clamps_negative_and_large_counts() {
        let service = Arc::new(StubPipeline::default());

        for (requested, expected) in [(-4, 0), (1_000, 50)] {
            let app = create_router(service.clone(), RequestDefaults::default());
            let (status, _) = send(
                app,
                Method::POST,
                "/api/keyword/summarize",
                Some(json!({ "keyword": "graphs", "max_results": requested, "max_length": 80 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let requests = service.requests.lock().await;
            assert_eq!(requests.last().expect("request").max_results(), expected);
        }
    }

    #[tokio::test]
    async fn blank_keyword_is_a_bad_request() {
        let service = Arc::new(StubPipeline::default());
        let app = create_router(service.clone(), RequestDefaults::default());

        let (status, body) = send(
            app,
            Method::POST,
            "/api/keyword/summarize",
            Some(json!({ "keyword": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().expect("detail").contains("blank"));
        assert!(service.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn search_route_returns_papers() {
        let (status, body) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/search?keyword=graphs&max_results=2",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["papers"].as_array().expect("papers").len(), 2);
    }

    #[tokio::test]
    async fn paper_routes_map_errors_to_status_codes() {
        let (status, body) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/2401.00001",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Paper 2401.00001");

        let (status, body) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/missing",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().expect("detail").contains("missing"));

        let (status, _) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/slow/text",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let (status, _) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/bad%20id",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn old_style_ids_can_be_percent_encoded() {
        let (status, body) = send(
            app(StubPipeline::default()),
            Method::GET,
            "/api/papers/hep-th%2F9901001/text",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paper_id"], "hep-th/9901001");
    }

    #[tokio::test]
    async fn paper_summary_body_is_optional() {
        let (status, body) = send(
            app(StubPipeline::default()),
            Method::POST,
            "/api/papers/2401.00001/summarize",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "summary in 500");

        let (status, body) = send(
            app(StubPipeline::default()),
            Method::POST,
            "/api/papers/2401.00001/summarize",
            Some(json!({ "max_length": 120 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "summary in 120");
    }

    #[tokio::test]
    async fn cache_clear_and_metrics_routes() {
        let service = Arc::new(StubPipeline::default());

        let (status, body) = send(
            create_router(service.clone(), RequestDefaults::default()),
            Method::POST,
            "/api/cache/clear",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(service.clears.load(Ordering::SeqCst), 1);

        let (status, body) = send(
            create_router(service, RequestDefaults::default()),
            Method::GET,
            "/api/metrics",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["searches_run"], 4);
        assert_eq!(body["caches"]["summary"]["entries"], 0);
    }

    fn app(service: StubPipeline) -> Router {
        create_router(Arc::new(service), RequestDefaults::default())
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        payload: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match payload {
            Some(payload) => {
                request = request.header("content-type", "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn handle(id: &str) -> DocumentHandle {
        DocumentHandle {
            id: id.to_string(),
            title: format!("Paper {id}"),
            authors: vec!["Ada Lovelace".into()],
            published: "2024-01-02".into(),
            updated: "2024-01-02".into(),
            abstract_text: "Abstract".into(),
            source_url: format!("http://arxiv.org/abs/{id}"),
            pdf_url: None,
            doi: None,
        }
    }

    #[derive(Default)]
    struct StubPipeline {
        requests: Mutex<Vec<SummarizeRequest>>,
        clears: AtomicUsize,
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn summarize_keyword(
            &self,
            request: SummarizeRequest,
        ) -> Result<BatchOutcome, PipelineError> {
            self.requests.lock().await.push(request);
            Ok(BatchOutcome {
                results: vec![PipelineResult::from_handle(&handle("2401.00001"), "short")],
                failures: vec![DocumentFailure::new(
                    "2401.00002",
                    FailureStage::Extraction,
                    "404",
                )],
                cancelled: false,
            })
        }

        async fn search_documents(
            &self,
            _keyword: &str,
            max_results: usize,
        ) -> Result<Vec<DocumentHandle>, PipelineError> {
            Ok((0..max_results).map(|i| handle(&format!("2401.0000{i}"))).collect())
        }

        async fn fetch_and_summarize_one(
            &self,
            document_id: &str,
            length_budget: usize,
        ) -> Result<PipelineResult, PipelineError> {
            let document_id = validate_document_id(document_id)?;
            Ok(PipelineResult::from_handle(
                &handle(document_id),
                &format!("summary in {length_budget}"),
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
            if document_id == "slow" {
                return Err(PipelineError::Cancelled);
            }
            Ok(ExtractedText {
                paper_id: document_id.to_string(),
                text: "body".into(),
            })
        }

        fn clear_caches(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                searches_run: 4,
                ..MetricsSnapshot::default()
            }
        }
    }
}
