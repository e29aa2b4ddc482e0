//! End-to-end handling of one question.
//!
//! compose prompt → call model (one re-authentication retry, recomposing on
//! the fresh session) → mine
//! suggestions → persist turn. Failures past composition end the turn with a
//! fixed message and the fallback questions; raw errors are only logged.

use crate::compose::{ComposedPrompt, PromptComposer};
use crate::connection::{ConnectionHandle, Session};
use crate::history::HistoryStore;
use crate::suggest::{fallback_questions, SuggestionMiner};
use crate::types::{
    AnswerRequest, AnswerResult, ConversationTurn, CONNECTION_FAILURE_ANSWER,
    GENERIC_FAILURE_ANSWER,
};
use chrono::Utc;
use medrag_llm::LlmRequest;
use std::sync::Arc;

/// How a completion attempt ended without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallFailure {
    /// Authentication could not be restored
    Connection,
    /// Anything else
    Generic,
}

impl CallFailure {
    fn into_result(self) -> AnswerResult {
        let answer = match self {
            CallFailure::Connection => CONNECTION_FAILURE_ANSWER,
            CallFailure::Generic => GENERIC_FAILURE_ANSWER,
        };

        AnswerResult {
            answer: answer.to_string(),
            related_documents: Vec::new(),
            suggested_questions: fallback_questions(),
        }
    }
}

/// Drives question-answer turns against the shared connection.
pub struct AnswerOrchestrator {
    connection: Arc<ConnectionHandle>,
    composer: PromptComposer,
    miner: Arc<SuggestionMiner>,
    history: Arc<dyn HistoryStore>,
    default_model: String,
    suggestion_count: usize,
}

impl AnswerOrchestrator {
    pub fn new(
        connection: Arc<ConnectionHandle>,
        composer: PromptComposer,
        miner: Arc<SuggestionMiner>,
        history: Arc<dyn HistoryStore>,
        default_model: impl Into<String>,
        suggestion_count: usize,
    ) -> Self {
        Self {
            connection,
            composer,
            miner,
            history,
            default_model: default_model.into(),
            suggestion_count,
        }
    }

    /// Answer one question. Never fails; degraded turns carry a fixed message.
    pub async fn answer(&self, request: &AnswerRequest) -> AnswerResult {
        let model = request
            .model_name
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        tracing::info!(
            "Answering question (model: {}, rag: {}, category: {})",
            model,
            request.use_rag,
            request.category
        );

        let session = match self.connection.current().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Cannot connect to the managed services: {}", e);
                return CallFailure::Connection.into_result();
            }
        };
        let (composed, answer) = match self.attempt(session, request, &model).await {
            Ok(done) => done,
            Err(failure) => return failure.into_result(),
        };

        let suggested_questions = self
            .miner
            .mine(&request.question, &request.category, self.suggestion_count)
            .await;
        let related_documents: Vec<String> = composed.cited_paths.into_iter().collect();

        if let Some(ref user_id) = request.user_id {
            let turn = ConversationTurn {
                user_id: user_id.clone(),
                org_id: request.org_id.clone(),
                question: request.question.clone(),
                answer: answer.clone(),
                model_name: model,
                category: request.category.clone(),
                related_documents: related_documents.clone(),
                suggested_questions: suggested_questions.clone(),
                timestamp: Utc::now(),
            };
            if !self.history.append(&turn).await {
                tracing::warn!("Turn for user {} was not saved to history", user_id);
            }
        }

        AnswerResult {
            answer,
            related_documents,
            suggested_questions,
        }
    }

    /// Compose and call the model, re-authenticating and retrying once on
    /// auth expiry. The retry recomposes on the fresh session so context that
    /// the stale token could not fetch is recovered.
    async fn attempt(
        &self,
        session: Arc<Session>,
        request: &AnswerRequest,
        model: &str,
    ) -> Result<(ComposedPrompt, String), CallFailure> {
        let composed = self.compose_on(&session, request).await;
        let llm_request = LlmRequest::new(composed.text.clone(), model);
        let err = match session.completion.complete(&llm_request).await {
            Ok(response) => return Ok((composed, response.content)),
            Err(e) => e,
        };

        if !err.is_auth_expired() {
            tracing::error!("Completion failed: {}", err);
            return Err(CallFailure::Generic);
        }

        tracing::warn!("Completion session expired, re-authenticating: {}", err);

        let fresh = self.connection.reconnect(&session).await.map_err(|e| {
            tracing::error!("Re-authentication failed: {}", e);
            CallFailure::Connection
        })?;

        let composed = self.compose_on(&fresh, request).await;
        let llm_request = LlmRequest::new(composed.text.clone(), model);
        match fresh.completion.complete(&llm_request).await {
            Ok(response) => Ok((composed, response.content)),
            Err(e) if e.is_auth_expired() => {
                tracing::error!("Completion still unauthenticated after reconnect: {}", e);
                Err(CallFailure::Connection)
            }
            Err(e) => {
                tracing::error!("Completion failed after reconnect: {}", e);
                Err(CallFailure::Generic)
            }
        }
    }

    async fn compose_on(&self, session: &Session, request: &AnswerRequest) -> ComposedPrompt {
        self.composer
            .compose(
                session.search.as_ref(),
                &request.question,
                request.use_rag,
                &request.category,
                request.user_id.as_deref(),
                request.org_id.as_deref(),
            )
            .await
    }
}
