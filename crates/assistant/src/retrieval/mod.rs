//! Context retrieval over the managed search index.

pub mod service;
pub mod types;

pub use service::{HttpSearchService, SearchRequest, SearchService};
pub use types::{RetrievedChunk, SearchResult};

use medrag_core::config::SearchConfig;
use medrag_core::AppResult;

/// Issues search calls with the configured columns and chunk bounds.
#[derive(Debug, Clone)]
pub struct ContextRetriever {
    columns: Vec<String>,
    max_chunks: usize,
}

impl ContextRetriever {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            max_chunks: config.max_chunks.max(1),
        }
    }

    /// Clamp a requested chunk count to `1..=max_chunks`.
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.max_chunks)
    }

    /// Search and validate the payload.
    ///
    /// A failing service yields `Ok` with a failed result; only a payload of
    /// the wrong shape is an error.
    pub async fn fetch(
        &self,
        search: &dyn SearchService,
        query: &str,
        category: &str,
        limit: usize,
    ) -> AppResult<SearchResult> {
        let request = SearchRequest::new(
            query,
            self.columns.clone(),
            category,
            self.clamp_limit(limit),
        );

        match search.search(&request).await {
            Ok(payload) => SearchResult::from_payload(payload),
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                Ok(SearchResult::failed(e.to_string()))
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but never fails.
    pub async fn retrieve(
        &self,
        search: &dyn SearchService,
        query: &str,
        category: &str,
        limit: usize,
    ) -> SearchResult {
        match self.fetch(search, query, category, limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Discarding search response: {}", e);
                SearchResult::failed(e.to_string())
            }
        }
    }
}
