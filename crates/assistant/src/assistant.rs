//! The assistant facade: every logical operation behind one type.

use crate::catalog::{DocumentCatalog, SqliteCatalog};
use crate::compose::PromptComposer;
use crate::connection::{ConnectionHandle, Connector, HttpConnector};
use crate::history::{HistoryStore, SqliteHistoryStore};
use crate::orchestrator::AnswerOrchestrator;
use crate::retrieval::{ContextRetriever, SearchResult};
use crate::suggest::SuggestionMiner;
use crate::types::{AnswerRequest, AnswerResult, TurnSummary, UserStats, ALL_CATEGORIES};
use medrag_core::{AppConfig, AppResult};
use medrag_prompt::PromptLibrary;
use std::sync::Arc;

/// Entry point for answering, suggesting and reporting.
pub struct Assistant {
    connection: Arc<ConnectionHandle>,
    orchestrator: AnswerOrchestrator,
    miner: Arc<SuggestionMiner>,
    retriever: ContextRetriever,
    history: Arc<dyn HistoryStore>,
    catalog: Arc<dyn DocumentCatalog>,
    num_chunks: usize,
    suggestion_count: usize,
}

impl Assistant {
    /// Build an assistant wired to the HTTP services and the SQLite database.
    ///
    /// The services are first contacted when an operation needs them.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let storage = &config.storage;
        let history =
            SqliteHistoryStore::open(&storage.database_path, storage.create_history_table)?
                .with_retention(storage.history_retention_days);
        let catalog = SqliteCatalog::open(&storage.database_path)?;

        Ok(Self::new(
            config,
            Arc::new(HttpConnector::new(config)),
            Arc::new(history),
            Arc::new(catalog),
        ))
    }

    /// Build an assistant from explicit collaborators.
    pub fn new(
        config: &AppConfig,
        connector: Arc<dyn Connector>,
        history: Arc<dyn HistoryStore>,
        catalog: Arc<dyn DocumentCatalog>,
    ) -> Self {
        let connection = Arc::new(ConnectionHandle::new(connector));
        let retriever = ContextRetriever::new(&config.search);
        let library = PromptLibrary::with_overrides(config.assistant.prompts_dir.as_deref());

        let miner = Arc::new(SuggestionMiner::new(
            catalog.clone(),
            config.assistant.question_scan_limit,
        ));
        let composer = PromptComposer::new(
            retriever.clone(),
            library,
            history.clone(),
            config.search.num_chunks,
            config.assistant.history_turns,
        );
        let orchestrator = AnswerOrchestrator::new(
            connection.clone(),
            composer,
            miner.clone(),
            history.clone(),
            config.model.clone(),
            config.assistant.min_suggested_questions,
        );

        tracing::info!("Assistant ready (model: {})", config.model);

        Self {
            connection,
            orchestrator,
            miner,
            retriever,
            history,
            catalog,
            num_chunks: config.search.num_chunks,
            suggestion_count: config.assistant.min_suggested_questions,
        }
    }

    /// Answer a question.
    pub async fn answer(&self, request: &AnswerRequest) -> AnswerResult {
        self.orchestrator.answer(request).await
    }

    /// Suggested questions for `question` without answering it.
    pub async fn suggest(&self, question: &str, category: Option<&str>) -> Vec<String> {
        let category = category.unwrap_or(ALL_CATEGORIES);
        self.miner
            .mine(question, category, self.suggestion_count)
            .await
    }

    /// A user's most recent turns, newest first. Empty if the store fails.
    pub async fn history(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        limit: usize,
    ) -> Vec<TurnSummary> {
        match self.history.recent(user_id, org_id, limit).await {
            Ok(turns) => turns.into_iter().map(TurnSummary::from).collect(),
            Err(e) => {
                tracing::warn!("Failed to read history for {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// A user's aggregate activity. Zeroed if the store fails.
    pub async fn stats(&self, user_id: &str, org_id: Option<&str>) -> UserStats {
        match self.history.stats(user_id, org_id).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Failed to compute stats for {}: {}", user_id, e);
                UserStats::default()
            }
        }
    }

    /// Raw retrieval results for `query`.
    pub async fn raw_context(
        &self,
        query: &str,
        category: Option<&str>,
        num_chunks: Option<usize>,
    ) -> SearchResult {
        let session = match self.connection.current().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Cannot connect to the search service: {}", e);
                return SearchResult::failed(e.to_string());
            }
        };
        self.retriever
            .retrieve(
                session.search.as_ref(),
                query,
                category.unwrap_or(ALL_CATEGORIES),
                num_chunks.unwrap_or(self.num_chunks),
            )
            .await
    }

    /// Known categories, `ALL` first.
    pub async fn categories(&self) -> Vec<String> {
        match self.catalog.categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!("Failed to list categories: {}", e);
                vec![ALL_CATEGORIES.to_string()]
            }
        }
    }

    /// Indexed document paths.
    pub async fn documents(&self) -> Vec<String> {
        match self.catalog.documents().await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!("Failed to list documents: {}", e);
                Vec::new()
            }
        }
    }
}
