//! Conversation history persistence.

pub mod sqlite;

pub use sqlite::SqliteHistoryStore;

use crate::types::{ConversationTurn, UserStats};
use async_trait::async_trait;
use medrag_core::AppResult;

/// Typed repository over stored conversation turns.
///
/// A store that is unavailable reports it through `false`, empty results or
/// an error; callers treat none of these as fatal.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one turn. Returns whether it was stored.
    async fn append(&self, turn: &ConversationTurn) -> bool;

    /// Up to `limit` most recent turns of a user, newest first.
    async fn recent(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<ConversationTurn>>;

    /// Aggregate activity of a user.
    async fn stats(&self, user_id: &str, org_id: Option<&str>) -> AppResult<UserStats>;

    /// Whether the backing table exists.
    async fn table_exists(&self) -> bool;
}
