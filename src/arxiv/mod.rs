//! arXiv corpus integration: the document store contract and its Atom API client.

pub mod client;
mod feed;
pub mod types;

pub use client::ArxivClient;
pub use types::{DocumentHandle, DocumentStoreError};

use async_trait::async_trait;

/// Source of paper metadata consumed by the pipeline.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Search the corpus, returning at most `max_results` handles in the store's relevance order.
    async fn search(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, DocumentStoreError>;

    /// Look up a single document by identifier.
    async fn get_by_id(&self, id: &str) -> Result<DocumentHandle, DocumentStoreError>;
}
