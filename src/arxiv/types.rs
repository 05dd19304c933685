//! Shared types used by the arXiv client and the pipeline.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while resolving documents from the corpus.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// The query could not be resolved by the upstream store.
    #[error("Lookup failed: {0}")]
    Lookup(String),
    /// No document exists for the requested identifier.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// arXiv responded with an unexpected status code.
    #[error("Unexpected arXiv response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from arXiv.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The Atom feed could not be decoded.
    #[error("Malformed arXiv feed: {0}")]
    Decode(String),
}

/// Metadata describing a single paper, as returned by a search or lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    /// Corpus-unique identifier, e.g. `2401.01234v1`.
    pub id: String,
    /// Paper title with whitespace normalized.
    pub title: String,
    /// Author names in byline order.
    pub authors: Vec<String>,
    /// Submission date formatted as `YYYY-MM-DD`.
    pub published: String,
    /// Date of the latest revision formatted as `YYYY-MM-DD`.
    pub updated: String,
    /// Abstract as published on arXiv.
    pub abstract_text: String,
    /// Landing page of the paper.
    pub source_url: String,
    /// Direct link to the PDF, when the feed advertises one.
    pub pdf_url: Option<String>,
    /// Journal DOI, when one has been registered.
    pub doi: Option<String>,
}
