//! Error types for the medrag service.
//!
//! One enum covers every failure category the pipeline can observe. Most of
//! them are recovered locally by the assistant; only configuration and
//! startup errors reach the process boundary.

use thiserror::Error;

/// Unified error type for medrag crates.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Search service errors
    #[error("Search error: {0}")]
    Search(String),

    /// Conversation history storage errors
    #[error("History error: {0}")]
    History(String),

    /// Document catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The service rejected our credentials; a reconnect may fix it
    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    /// A collaborator answered with a payload of unexpected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error signals an expired or rejected session token.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::AuthExpired(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
