//! Typed search results.

use medrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A retrieved passage with its source document and category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: String,
    pub relative_path: String,
    pub category: String,
}

/// Uniform outcome of a retrieval call; failures carry `error` and no results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<RetrievedChunk>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    results: Vec<RawChunk>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChunk {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    relative_path: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

impl SearchResult {
    /// Validate a search service payload.
    ///
    /// The `results` array is required; missing chunk fields become empty
    /// strings.
    pub fn from_payload(payload: serde_json::Value) -> AppResult<Self> {
        let raw: RawPayload = serde_json::from_value(payload).map_err(|e| {
            AppError::MalformedPayload(format!("Unexpected search response shape: {}", e))
        })?;

        let results = raw
            .results
            .into_iter()
            .map(|c| RetrievedChunk {
                chunk: c.chunk.unwrap_or_default(),
                relative_path: c.relative_path.unwrap_or_default(),
                category: c.category.unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            results,
            error: raw.error,
        })
    }

    /// An empty result recording why retrieval failed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Distinct, non-empty source paths, in sorted order.
    pub fn cited_paths(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .filter(|c| !c.relative_path.is_empty())
            .map(|c| c.relative_path.clone())
            .collect()
    }
}
