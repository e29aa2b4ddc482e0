//! Request, result and record types of the assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "ALL";

/// Shown when the completion call fails for any reason other than auth.
pub const GENERIC_FAILURE_ANSWER: &str =
    "I'm unable to answer that question at the moment. Please try again later.";

/// Shown when re-authentication did not restore the completion service.
pub const CONNECTION_FAILURE_ANSWER: &str =
    "I'm unable to answer that question at the moment due to a connection issue. Please try again later.";

/// Input of one question-answer turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// The user's question
    pub question: String,

    /// Completion model; the configured default when absent
    pub model_name: Option<String>,

    /// Whether to ground the prompt in retrieved context and history
    pub use_rag: bool,

    /// Category filter, `ALL` for none
    pub category: String,

    /// User the turn is recorded for
    pub user_id: Option<String>,

    /// Organisation scope of the user
    pub org_id: Option<String>,
}

impl AnswerRequest {
    /// A RAG request over all categories, not tied to a user.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            model_name: None,
            use_rag: true,
            category: ALL_CATEGORIES.to_string(),
            user_id: None,
            org_id: None,
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_rag(mut self, use_rag: bool) -> Self {
        self.use_rag = use_rag;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, org_id: Option<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.org_id = org_id;
        self
    }
}

/// Outcome of one turn, success or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub related_documents: Vec<String>,
    pub suggested_questions: Vec<String>,
}

/// A persisted question-answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub org_id: Option<String>,
    pub question: String,
    pub answer: String,
    pub model_name: String,
    pub category: String,
    pub related_documents: Vec<String>,
    pub suggested_questions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// The slice of a turn returned by history queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
}

impl From<ConversationTurn> for TurnSummary {
    fn from(turn: ConversationTurn) -> Self {
        Self {
            question: turn.question,
            answer: turn.answer,
            timestamp: turn.timestamp,
            category: turn.category,
        }
    }
}

/// Aggregate activity of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_questions: u64,
    pub first_interaction: Option<DateTime<Utc>>,
    pub last_interaction: Option<DateTime<Utc>>,
    pub categories_count: usize,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_request_builder() {
        let request = AnswerRequest::new("What is the dose?")
            .with_model("llama3.3-70b")
            .with_category("cardiology")
            .with_user("u1", Some("org1".to_string()));

        assert!(request.use_rag);
        assert_eq!(request.category, "cardiology");
        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert_eq!(request.org_id.as_deref(), Some("org1"));
    }

    #[test]
    fn test_turn_summary_from_turn() {
        let turn = ConversationTurn {
            user_id: "u1".to_string(),
            org_id: None,
            question: "Q?".to_string(),
            answer: "A".to_string(),
            model_name: "m".to_string(),
            category: "ALL".to_string(),
            related_documents: vec!["a.pdf".to_string()],
            suggested_questions: Vec::new(),
            timestamp: Utc::now(),
        };

        let summary = TurnSummary::from(turn.clone());
        assert_eq!(summary.question, turn.question);
        assert_eq!(summary.timestamp, turn.timestamp);
    }
}
