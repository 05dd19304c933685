use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arxiv::{DocumentHandle, DocumentStoreError};
use crate::extraction::ExtractionError;
use crate::summarization::SummarizationError;

/// Concurrency and deadline settings injected into the pipeline at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Upper bound on documents processed at once within a batch.
    pub workers: usize,
    /// Deadline applied to every request; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            request_timeout: None,
        }
    }
}

/// Caller-supplied input rejected before any external call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Keyword was empty or whitespace.
    #[error("keyword must not be blank")]
    EmptyKeyword,
    /// Document identifier was empty or whitespace.
    #[error("document id must not be blank")]
    EmptyDocumentId,
    /// Document identifier contained characters that cannot name an arXiv paper.
    #[error("invalid document id `{0}`")]
    InvalidDocumentId(String),
    /// A summary of zero characters was requested.
    #[error("max_length must be greater than zero")]
    ZeroLengthBudget,
}

/// Errors surfaced by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid caller input.
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),
    /// Search or metadata lookup failed.
    #[error("Document lookup failed: {0}")]
    Lookup(#[from] DocumentStoreError),
    /// Text extraction failed.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// Summarization failed.
    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizationError),
    /// The request was cancelled or ran past its deadline.
    #[error("Request cancelled before completion")]
    Cancelled,
}

/// Validated keyword-summarization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeRequest {
    keyword: String,
    max_results: usize,
    length_budget: usize,
}

impl SummarizeRequest {
    /// Validate and build a request. The keyword is trimmed; `max_results` of zero is allowed
    /// and yields an empty outcome.
    pub fn new(keyword: &str, max_results: usize, length_budget: usize) -> Result<Self, InputError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(InputError::EmptyKeyword);
        }
        validate_length_budget(length_budget)?;
        Ok(Self {
            keyword: keyword.to_string(),
            max_results,
            length_budget,
        })
    }

    /// Search keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Maximum number of documents to process.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Summary length budget in characters.
    pub fn length_budget(&self) -> usize {
        self.length_budget
    }
}

/// Trim and check an arXiv identifier such as `2401.00001v2` or `hep-th/9901001`.
pub fn validate_document_id(document_id: &str) -> Result<&str, InputError> {
    let document_id = document_id.trim();
    if document_id.is_empty() {
        return Err(InputError::EmptyDocumentId);
    }
    let valid = document_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-' | '_'));
    if !valid || document_id.starts_with('/') || document_id.contains("..") {
        return Err(InputError::InvalidDocumentId(document_id.to_string()));
    }
    Ok(document_id)
}

/// Reject a zero-character summary budget.
pub fn validate_length_budget(length_budget: usize) -> Result<usize, InputError> {
    if length_budget == 0 {
        return Err(InputError::ZeroLengthBudget);
    }
    Ok(length_budget)
}

/// A summarized paper, ready to render as a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// arXiv identifier.
    pub paper_id: String,
    /// Paper title.
    pub title: String,
    /// Author names in listed order.
    pub authors: Vec<String>,
    /// Generated summary.
    pub summary: String,
    /// Publication date, `YYYY-MM-DD`.
    pub published: String,
    /// Direct PDF link when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl PipelineResult {
    /// Combine document metadata with its summary.
    pub fn from_handle(handle: &DocumentHandle, summary: &str) -> Self {
        Self {
            paper_id: handle.id.clone(),
            title: handle.title.clone(),
            authors: handle.authors.clone(),
            summary: summary.to_string(),
            published: handle.published.clone(),
            pdf_url: handle.pdf_url.clone(),
        }
    }
}

/// Full text extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    /// arXiv identifier.
    pub paper_id: String,
    /// Extracted plain text; may be empty for image-only PDFs.
    pub text: String,
}

/// Stage at which a document dropped out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Downloading or parsing the document failed.
    Extraction,
    /// The summarizer failed.
    Summarization,
    /// The batch was cancelled before the document finished.
    Cancelled,
    /// The worker task died.
    Worker,
}

/// Why a single document is missing from a batch's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    /// arXiv identifier.
    pub document_id: String,
    /// Stage that failed.
    pub stage: FailureStage,
    /// Human-readable cause.
    pub message: String,
}

impl DocumentFailure {
    /// Record a failure for `document_id`.
    pub fn new(document_id: &str, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            document_id: document_id.to_string(),
            stage,
            message: message.into(),
        }
    }
}

/// Outcome of one document's extract-then-summarize task.
pub type DocumentOutcome = Result<PipelineResult, DocumentFailure>;

/// Results of a keyword batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Successful results in search order.
    pub results: Vec<PipelineResult>,
    /// Documents that failed, in search order.
    pub failures: Vec<DocumentFailure>,
    /// Whether cancellation or the deadline cut the batch short.
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Fold per-slot outcomes, kept in search order, into results and failures.
    pub fn from_outcomes(
        outcomes: impl IntoIterator<Item = DocumentOutcome>,
        cancelled: bool,
    ) -> Self {
        let mut batch = Self {
            cancelled,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(result) => batch.results.push(result),
                Err(failure) => batch.failures.push(failure),
            }
        }
        batch
    }
}
