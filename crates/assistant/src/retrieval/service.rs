//! Search service client.

use async_trait::async_trait;
use medrag_core::{AppError, AppResult};
use medrag_llm::providers::is_auth_failure;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::types::ALL_CATEGORIES;

/// One search call: query text, requested columns, optional filter, limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    pub limit: usize,
}

impl SearchRequest {
    /// Build a request; any category but `ALL` becomes an equality filter.
    pub fn new(
        query: impl Into<String>,
        columns: Vec<String>,
        category: &str,
        limit: usize,
    ) -> Self {
        let filter =
            (category != ALL_CATEGORIES).then(|| json!({"@eq": {"category": category}}));

        Self {
            query: query.into(),
            columns,
            filter,
            limit,
        }
    }
}

/// The managed search index.
///
/// Implementations return the raw response body; validation happens in
/// [`super::SearchResult::from_payload`].
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> AppResult<Value>;
}

/// Search service reached over HTTP with bearer authentication.
pub struct HttpSearchService {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpSearchService {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            token,
            client,
        })
    }
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn search(&self, request: &SearchRequest) -> AppResult<Value> {
        tracing::debug!(
            "Searching {} (limit: {}, filtered: {})",
            self.endpoint,
            request.limit,
            request.filter.is_some()
        );

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach search service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_auth_failure(status.as_u16(), &body) {
                return Err(AppError::AuthExpired(format!(
                    "Search service rejected credentials ({}): {}",
                    status, body
                )));
            }
            return Err(AppError::Search(format!(
                "Search service error ({}): {}",
                status, body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::MalformedPayload(format!("Search response is not JSON: {}", e)))
    }
}
