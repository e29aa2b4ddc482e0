//! Completion provider implementations.

pub mod managed;
pub mod ollama;

pub use managed::ManagedClient;
pub use ollama::OllamaClient;

use medrag_core::AppError;

/// Vendor message for an expired session token.
const EXPIRED_TOKEN_MARKER: &str = "authentication token has expired";

/// Whether an HTTP failure means the session credentials are no longer valid.
pub fn is_auth_failure(status: u16, body: &str) -> bool {
    status == 401 || status == 403 || body.to_lowercase().contains(EXPIRED_TOKEN_MARKER)
}

/// Map a non-success HTTP response onto the error taxonomy.
pub(crate) fn classify_failure(service: &str, status: u16, body: &str) -> AppError {
    if is_auth_failure(status, body) {
        AppError::AuthExpired(format!("{} rejected credentials ({}): {}", service, status, body))
    } else {
        AppError::Llm(format!("{} API error ({}): {}", service, status, body))
    }
}
