//! HTTP client wrapper for the arXiv query API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::arxiv::{
    DocumentStore,
    feed::parse_feed,
    types::{DocumentHandle, DocumentStoreError},
};

/// Lightweight HTTP client for arXiv Atom queries.
pub struct ArxivClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl ArxivClient {
    /// Construct a client targeting the given query endpoint.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DocumentStoreError> {
        let client = Client::builder()
            .user_agent("arxiv-sage/0.1")
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!(url = %base_url, "Initialized arXiv HTTP client");
        Ok(Self { client, base_url })
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<Vec<DocumentHandle>, DocumentStoreError> {
        let response = self.client.get(&self.base_url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocumentStoreError::UnexpectedStatus { status, body });
        }
        let body = response.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl DocumentStore for ArxivClient {
    async fn search(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<DocumentHandle>, DocumentStoreError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        tracing::debug!(keyword, max_results, "Searching arXiv");
        let handles = self
            .query(&[
                ("search_query", keyword.to_string()),
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ])
            .await?;
        tracing::debug!(keyword, found = handles.len(), "arXiv search completed");
        Ok(handles)
    }

    async fn get_by_id(&self, id: &str) -> Result<DocumentHandle, DocumentStoreError> {
        self.query(&[("id_list", id.to_string()), ("max_results", "1".to_string())])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))
    }
}
