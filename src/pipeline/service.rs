//! Pipeline service coordinating search, extraction, and summarization.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    arxiv::{ArxivClient, DocumentHandle, DocumentStore, DocumentStoreError},
    config::Config,
    extraction::{ExtractionError, PdfTextExtractor, TextExtractor},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        cache::{CacheLayer, SearchKey, SummaryKey},
        fingerprint::fingerprint,
        types::{
            BatchOutcome, DocumentFailure, DocumentOutcome, ExtractedText, FailureStage,
            InputError, PipelineError, PipelineResult, PipelineSettings, SummarizeRequest,
            validate_document_id, validate_length_budget,
        },
    },
    summarization::{SummarizationError, Summarizer, build_summarizer},
};

/// Turns a keyword into summarized papers.
///
/// The service owns the document store, extractor, and summarizer handles together with the
/// shared caches and metrics, so that the HTTP surface, the MCP tools, and the CLI all reuse the
/// same components. Construct it once near process start and share it through an `Arc`.
///
/// Within a batch each document is processed independently: a failing document is reported in
/// [`BatchOutcome::failures`] and never aborts its siblings, and results always come back in
/// search order regardless of completion order.
pub struct SummaryPipeline {
    store: Arc<dyn DocumentStore>,
    worker: DocumentWorker,
    caches: Arc<CacheLayer>,
    metrics: Arc<PipelineMetrics>,
    settings: PipelineSettings,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Search for `request.keyword()` and summarize every hit under the request deadline.
    async fn summarize_keyword(
        &self,
        request: SummarizeRequest,
    ) -> Result<BatchOutcome, PipelineError>;

    /// Search the document store, reusing cached results for identical queries.
    async fn search_documents(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, PipelineError>;

    /// Look up, extract, and summarize a single document.
    async fn fetch_and_summarize_one(
        &self,
        document_id: &str,
        length_budget: usize,
    ) -> Result<PipelineResult, PipelineError>;

    /// Look up metadata for a single document.
    async fn fetch_metadata(&self, document_id: &str) -> Result<DocumentHandle, PipelineError>;

    /// Extract the full text of a single document.
    async fn fetch_and_extract(&self, document_id: &str) -> Result<ExtractedText, PipelineError>;

    /// Drop every cached search, text, and summary.
    fn clear_caches(&self);

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummaryPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
        settings: PipelineSettings,
    ) -> Self {
        let caches = Arc::new(CacheLayer::new());
        Self {
            store,
            worker: DocumentWorker {
                extractor,
                summarizer,
                caches: Arc::clone(&caches),
            },
            caches,
            metrics: Arc::new(PipelineMetrics::new()),
            settings,
        }
    }

    /// Build the arXiv-backed pipeline described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let store = ArxivClient::new(&config.arxiv_api_url, config.http_timeout())?;
        let extractor = PdfTextExtractor::new(&config.arxiv_pdf_url, config.http_timeout())?;
        let summarizer = build_summarizer(config)?;
        let settings = config.pipeline_settings();
        tracing::info!(
            workers = settings.workers,
            timeout_secs = ?settings.request_timeout.map(|timeout| timeout.as_secs()),
            "Pipeline initialized"
        );
        Ok(Self::new(
            Arc::new(store),
            Arc::new(extractor),
            summarizer,
            settings,
        ))
    }

    /// Summarize the papers matching `request`, returning successes in search order.
    ///
    /// Documents that fail are logged and omitted; use [`Self::summarize_batch`] to see them.
    pub async fn summarize(
        &self,
        request: &SummarizeRequest,
    ) -> Result<Vec<PipelineResult>, PipelineError> {
        let outcome = self
            .summarize_batch(request, &CancellationToken::new())
            .await?;
        Ok(outcome.results)
    }

    /// Search, then extract and summarize every hit with at most `workers` documents in flight.
    ///
    /// Cancelling `cancel`, reaching the configured deadline, or dropping the returned future
    /// stops every in-flight document. Documents finished by then are still returned, with
    /// [`BatchOutcome::cancelled`] set.
    pub async fn summarize_batch(
        &self,
        request: &SummarizeRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, PipelineError> {
        let token = cancel.child_token();
        let _stop_workers = token.clone().drop_guard();
        let _deadline = self.arm_deadline(&token);

        let keyword = request.keyword();
        let handles = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            handles = self.cached_search(keyword, request.max_results()) => Some(handles?),
        };
        let Some(handles) = handles else {
            tracing::warn!(keyword, "Batch cancelled during search");
            self.metrics.record_cancelled();
            return Ok(BatchOutcome {
                cancelled: true,
                ..BatchOutcome::default()
            });
        };

        let length_budget = request.length_budget();
        let mut slots: Vec<Option<DocumentOutcome>> = vec![None; handles.len()];
        let mut tasks = stream::iter(handles.iter().cloned().enumerate())
            .map(|(index, handle)| {
                let worker = self.worker.clone();
                let token = token.clone();
                async move {
                    let document_id = handle.id.clone();
                    let outcome = tokio::spawn(worker.process(handle, length_budget, token))
                        .await
                        .unwrap_or_else(|error| {
                            tracing::error!(%document_id, %error, "Document worker failed");
                            Err(DocumentFailure::new(
                                &document_id,
                                FailureStage::Worker,
                                error.to_string(),
                            ))
                        });
                    (index, outcome)
                }
            })
            .buffer_unordered(self.settings.workers.max(1));

        while let Some((index, outcome)) = tasks.next().await {
            slots[index] = Some(outcome);
        }

        let cancelled = slots.iter().flatten().any(|outcome| {
            matches!(outcome, Err(failure) if failure.stage == FailureStage::Cancelled)
        });
        let outcome = BatchOutcome::from_outcomes(slots.into_iter().flatten(), cancelled);

        self.metrics.record_documents(
            outcome.results.len() as u64,
            outcome
                .failures
                .iter()
                .filter(|failure| failure.stage != FailureStage::Cancelled)
                .count() as u64,
        );
        if cancelled {
            self.metrics.record_cancelled();
        }
        tracing::info!(
            keyword,
            found = handles.len(),
            summarized = outcome.results.len(),
            failed = outcome.failures.len(),
            cancelled,
            "Batch finished"
        );
        Ok(outcome)
    }

    /// Search the document store. A `max_results` of zero makes no external call.
    pub async fn search_documents(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, PipelineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(InputError::EmptyKeyword.into());
        }
        self.within_deadline(async {
            let handles = self.cached_search(keyword, max_results).await?;
            Ok::<_, PipelineError>(handles.as_ref().clone())
        })
        .await
    }

    /// Look up, extract, and summarize a single document.
    pub async fn fetch_and_summarize_one(
        &self,
        document_id: &str,
        length_budget: usize,
    ) -> Result<PipelineResult, PipelineError> {
        let document_id = validate_document_id(document_id)?;
        let length_budget = validate_length_budget(length_budget)?;

        let result = self
            .within_deadline(async {
                let (handle, text) = tokio::try_join!(
                    self.cached_metadata(document_id),
                    async {
                        self.worker
                            .extract(document_id)
                            .await
                            .map_err(PipelineError::from)
                    },
                )?;
                let summary = self.worker.summarize(&text, length_budget).await?;
                Ok::<_, PipelineError>(PipelineResult::from_handle(&handle, &summary))
            })
            .await;

        match &result {
            Ok(_) => self.metrics.record_documents(1, 0),
            Err(PipelineError::Extraction(_) | PipelineError::Summarization(_)) => {
                self.metrics.record_documents(0, 1)
            }
            Err(_) => {}
        }
        result
    }

    /// Look up metadata for a single document.
    pub async fn fetch_metadata(&self, document_id: &str) -> Result<DocumentHandle, PipelineError> {
        let document_id = validate_document_id(document_id)?;
        self.within_deadline(self.cached_metadata(document_id))
            .await
    }

    /// Extract the full text of a single document.
    pub async fn fetch_and_extract(
        &self,
        document_id: &str,
    ) -> Result<ExtractedText, PipelineError> {
        let document_id = validate_document_id(document_id)?;
        self.within_deadline(async {
            let text = self.worker.extract(document_id).await?;
            Ok::<_, PipelineError>(ExtractedText {
                paper_id: document_id.to_string(),
                text: text.to_string(),
            })
        })
        .await
    }

    /// Drop every cached value. Safe to call at any time, including mid-batch.
    pub fn clear_caches(&self) {
        self.caches.clear();
    }

    /// Current counters and cache statistics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.caches.stats())
    }

    async fn cached_search(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Arc<Vec<DocumentHandle>>, DocumentStoreError> {
        if max_results == 0 {
            return Ok(Arc::new(Vec::new()));
        }
        let key = SearchKey {
            keyword: keyword.to_string(),
            max_results,
        };
        self.caches
            .search_results(key, || async {
                self.metrics.record_search();
                tracing::info!(keyword, max_results, "Searching arXiv");
                self.store.search(keyword, max_results).await.map(Arc::new)
            })
            .await
    }

    async fn cached_metadata(&self, document_id: &str) -> Result<DocumentHandle, PipelineError> {
        let handle = self
            .caches
            .metadata(document_id, || self.store.get_by_id(document_id))
            .await?;
        Ok(handle)
    }

    async fn within_deadline<T, F>(&self, operation: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        match self.settings.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, operation)
                .await
                .map_err(|_| PipelineError::Cancelled)?,
            None => operation.await,
        }
    }

    fn arm_deadline(&self, token: &CancellationToken) -> DeadlineGuard {
        let timer = self.settings.request_timeout.map(|timeout| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                tracing::warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "Request deadline reached; cancelling batch"
                );
                token.cancel();
            })
        });
        DeadlineGuard(timer)
    }
}

#[async_trait]
impl PipelineApi for SummaryPipeline {
    async fn summarize_keyword(
        &self,
        request: SummarizeRequest,
    ) -> Result<BatchOutcome, PipelineError> {
        SummaryPipeline::summarize_batch(self, &request, &CancellationToken::new()).await
    }

    async fn search_documents(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, PipelineError> {
        SummaryPipeline::search_documents(self, keyword, max_results).await
    }

    async fn fetch_and_summarize_one(
        &self,
        document_id: &str,
        length_budget: usize,
    ) -> Result<PipelineResult, PipelineError> {
        SummaryPipeline::fetch_and_summarize_one(self, document_id, length_budget).await
    }

    async fn fetch_metadata(&self, document_id: &str) -> Result<DocumentHandle, PipelineError> {
        SummaryPipeline::fetch_metadata(self, document_id).await
    }

    async fn fetch_and_extract(&self, document_id: &str) -> Result<ExtractedText, PipelineError> {
        SummaryPipeline::fetch_and_extract(self, document_id).await
    }

    fn clear_caches(&self) {
        SummaryPipeline::clear_caches(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummaryPipeline::metrics_snapshot(self)
    }
}

/// Per-document half of the pipeline, cloned into each spawned task.
#[derive(Clone)]
struct DocumentWorker {
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    caches: Arc<CacheLayer>,
}

impl DocumentWorker {
    async fn process(
        self,
        handle: DocumentHandle,
        length_budget: usize,
        token: CancellationToken,
    ) -> DocumentOutcome {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(DocumentFailure::new(
                &handle.id,
                FailureStage::Cancelled,
                "cancelled before the document finished",
            )),
            outcome = self.run(&handle, length_budget) => outcome,
        }
    }

    async fn run(&self, handle: &DocumentHandle, length_budget: usize) -> DocumentOutcome {
        let text = self.extract(&handle.id).await.map_err(|error| {
            tracing::warn!(document_id = %handle.id, %error, "Extraction failed; skipping document");
            DocumentFailure::new(&handle.id, FailureStage::Extraction, error.to_string())
        })?;

        let summary = self
            .summarize(&text, length_budget)
            .await
            .map_err(|error| {
                tracing::warn!(document_id = %handle.id, %error, "Summarization failed; skipping document");
                DocumentFailure::new(&handle.id, FailureStage::Summarization, error.to_string())
            })?;

        tracing::debug!(document_id = %handle.id, "Document summarized");
        Ok(PipelineResult::from_handle(handle, &summary))
    }

    async fn extract(&self, document_id: &str) -> Result<Arc<str>, ExtractionError> {
        self.caches
            .extracted_text(document_id, || async {
                let text = self.extractor.extract(document_id).await;
                if let Ok(text) = &text {
                    tracing::debug!(document_id, chars = text.len(), "Text extracted");
                }
                text.map(Arc::<str>::from)
            })
            .await
    }

    async fn summarize(
        &self,
        text: &str,
        length_budget: usize,
    ) -> Result<Arc<str>, SummarizationError> {
        let key = SummaryKey {
            fingerprint: fingerprint(text),
            length_budget,
        };
        self.caches
            .summary(key, || async {
                self.summarizer
                    .summarize(text, length_budget)
                    .await
                    .map(Arc::<str>::from)
            })
            .await
    }
}

/// Aborts the deadline timer once the batch it guards has returned.
struct DeadlineGuard(Option<JoinHandle<()>>);

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        if let Some(timer) = self.0.take() {
            timer.abort();
        }
    }
}
