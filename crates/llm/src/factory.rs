//! Completion provider factory.
//!
//! Resolves a provider name plus connection options into a ready client.

use crate::client::LlmClient;
use crate::providers::{ManagedClient, OllamaClient};
use crate::types::ProviderType;
use medrag_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Connection options shared by every provider.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Endpoint override; the provider default is used when absent
    pub endpoint: Option<String>,

    /// Bearer token for providers that authenticate
    pub token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Create a completion client for `provider`.
///
/// # Errors
/// Returns `AppError::Config` for an unknown provider and `AppError::Llm` if
/// the HTTP client cannot be built.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let endpoint = options
        .endpoint
        .clone()
        .unwrap_or_else(|| provider_type.default_endpoint().to_string());

    tracing::debug!(
        "Creating {} completion client for {}",
        provider_type.as_str(),
        endpoint
    );

    match provider_type {
        ProviderType::Managed => {
            if options.token.is_none() {
                tracing::warn!("Managed completion client created without a bearer token");
            }
            let client = ManagedClient::new(endpoint, options.token.clone(), options.timeout)?;
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let client = OllamaClient::with_timeout(endpoint, options.timeout)?;
            Ok(Arc::new(client))
        }
    }
}
