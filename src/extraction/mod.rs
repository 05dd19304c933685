//! Full-text extraction for papers.
//!
//! The production extractor downloads the paper PDF over HTTP and runs the text extraction on a
//! blocking thread so the async workers stay responsive while large documents are parsed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors raised while turning a document into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The PDF endpoint has no file for the identifier.
    #[error("PDF not found for document {0}")]
    NotFound(String),
    /// The PDF endpoint answered with an unexpected status code.
    #[error("Unexpected PDF response ({status}) for document {document_id}")]
    UnexpectedStatus {
        /// Identifier of the document being downloaded.
        document_id: String,
        /// HTTP status returned by the server.
        status: StatusCode,
    },
    /// The downloaded bytes could not be parsed as a PDF.
    #[error("Failed to extract text from document {document_id}: {message}")]
    Parse {
        /// Identifier of the document being parsed.
        document_id: String,
        /// Parser diagnostic.
        message: String,
    },
    /// The blocking extraction task panicked or was aborted.
    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Interface implemented by full-text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Return the full plain text of a document. An empty string is a valid result.
    async fn extract(&self, document_id: &str) -> Result<String, ExtractionError>;
}

/// Downloads paper PDFs and extracts their text.
pub struct PdfTextExtractor {
    http: Client,
    base_url: String,
}

impl PdfTextExtractor {
    /// Build an extractor fetching PDFs from `{base_url}/{document_id}`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .user_agent("arxiv-sage/pdf")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn pdf_url(&self, document_id: &str) -> String {
        format!("{}/{}", self.base_url, document_id)
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document_id: &str) -> Result<String, ExtractionError> {
        let url = self.pdf_url(document_id);
        tracing::debug!(document_id, %url, "Downloading PDF");
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExtractionError::NotFound(document_id.to_string()));
        }
        if !status.is_success() {
            return Err(ExtractionError::UnexpectedStatus {
                document_id: document_id.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        let size = bytes.len();
        let owned_id = document_id.to_string();
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|error| ExtractionError::Parse {
                document_id: owned_id,
                message: error.to_string(),
            })
        })
        .await
        .map_err(|error| ExtractionError::Worker(error.to_string()))??;

        let text = tidy_text(&text);
        tracing::debug!(document_id, bytes = size, chars = text.len(), "Extracted PDF text");
        Ok(text)
    }
}

/// Trim every line and collapse runs of blank lines left behind by page breaks.
pub(crate) fn tidy_text(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut blank_run = false;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run = true;
            continue;
        }
        if !output.is_empty() {
            output.push('\n');
            if blank_run {
                output.push('\n');
            }
        }
        output.push_str(line);
        blank_run = false;
    }
    output
}
