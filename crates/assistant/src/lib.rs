//! Retrieval-augmented question answering over clinical documents.
//!
//! The [`Assistant`] answers questions by retrieving passages from a managed
//! search index, composing a prompt with the user's recent conversation, and
//! calling a managed completion model. Every service failure degrades to a
//! usable answer instead of an error.
//!
//! # Example
//! ```no_run
//! use medrag_assistant::{AnswerRequest, Assistant};
//! use medrag_core::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! let assistant = Assistant::from_config(&config)?;
//!
//! let request = AnswerRequest::new("What was the discharge medication?")
//!     .with_user("u1", None);
//! let result = assistant.answer(&request).await;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod catalog;
pub mod compose;
pub mod connection;
pub mod credentials;
pub mod history;
pub mod orchestrator;
pub mod retrieval;
pub mod suggest;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use assistant::Assistant;
pub use catalog::{DocumentCatalog, SqliteCatalog};
pub use compose::{ComposedPrompt, PromptComposer};
pub use connection::{ConnectionHandle, Connector, HttpConnector, Session};
pub use history::{HistoryStore, SqliteHistoryStore};
pub use orchestrator::AnswerOrchestrator;
pub use retrieval::{ContextRetriever, RetrievedChunk, SearchRequest, SearchResult, SearchService};
pub use types::{
    AnswerRequest, AnswerResult, ConversationTurn, TurnSummary, UserStats, ALL_CATEGORIES,
};
