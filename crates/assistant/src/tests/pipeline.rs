//! End-to-end behaviour of composition, answering and reporting.

use super::mocks::{BrokenHistory, MockConnector, MockLlm, MockSearch, Reply};
use crate::assistant::Assistant;
use crate::catalog::SqliteCatalog;
use crate::compose::PromptComposer;
use crate::history::{HistoryStore, SqliteHistoryStore};
use crate::retrieval::ContextRetriever;
use crate::suggest::{fallback_questions, is_similar};
use crate::types::{AnswerRequest, CONNECTION_FAILURE_ANSWER, GENERIC_FAILURE_ANSWER};
use medrag_core::AppConfig;
use medrag_prompt::PromptLibrary;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

const PLAIN_PROMPT: &str = "Question:\nWhat is the dose?\nAnswer: ";

fn composer(history: Arc<dyn HistoryStore>) -> PromptComposer {
    PromptComposer::new(
        ContextRetriever::new(&Default::default()),
        PromptLibrary::builtin(),
        history,
        3,
        3,
    )
}

fn memory_history() -> Arc<SqliteHistoryStore> {
    Arc::new(SqliteHistoryStore::open_in_memory(true).unwrap())
}

fn seeded_catalog() -> Arc<SqliteCatalog> {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    catalog
        .insert_chunk(
            "How is insulin stored on the ward? In the fridge.",
            "a.pdf",
            "pharmacy",
        )
        .unwrap();
    catalog
        .insert_chunk("Discharge happens at noon.", "b.pdf", "wards")
        .unwrap();
    Arc::new(catalog)
}

fn assistant_with(connector: Arc<MockConnector>, history: Arc<dyn HistoryStore>) -> Assistant {
    Assistant::new(&AppConfig::default(), connector, history, seeded_catalog())
}

mod compose {
    use super::*;

    #[tokio::test]
    async fn test_without_rag_skips_retrieval() {
        let search = MockSearch::with_paths(&["a.pdf"]);

        let prompt = composer(memory_history())
            .compose(
                search.as_ref(),
                "What is the dose?",
                false,
                "ALL",
                Some("u1"),
                None,
            )
            .await;

        assert_eq!(search.call_count(), 0);
        assert_eq!(prompt.text, PLAIN_PROMPT);
        assert!(prompt.cited_paths.is_empty());
    }

    #[tokio::test]
    async fn test_missing_results_key_falls_back() {
        let search = MockSearch::returning(json!({"data": []}));

        let prompt = composer(memory_history())
            .compose(search.as_ref(), "What is the dose?", true, "ALL", None, None)
            .await;

        assert_eq!(search.call_count(), 1);
        assert_eq!(prompt.text, PLAIN_PROMPT);
        assert!(prompt.cited_paths.is_empty());
    }

    #[tokio::test]
    async fn test_cited_paths_are_deduplicated() {
        let search = MockSearch::with_paths(&["a.pdf", "a.pdf", "b.pdf"]);

        let prompt = composer(memory_history())
            .compose(search.as_ref(), "What is the dose?", true, "ALL", None, None)
            .await;

        let expected: BTreeSet<String> =
            ["a.pdf", "b.pdf"].iter().map(|s| s.to_string()).collect();
        assert_eq!(prompt.cited_paths, expected);
        assert!(prompt.text.contains("[Document 3] b.pdf (clinical)"));
        assert!(prompt.text.contains("<question>\nWhat is the dose?\n</question>"));
    }

    #[tokio::test]
    async fn test_history_failure_falls_back() {
        let search = MockSearch::with_paths(&["a.pdf"]);

        let prompt = composer(Arc::new(BrokenHistory))
            .compose(
                search.as_ref(),
                "What is the dose?",
                true,
                "ALL",
                Some("u1"),
                None,
            )
            .await;

        assert_eq!(prompt.text, PLAIN_PROMPT);
        assert!(prompt.cited_paths.is_empty());
    }

    #[tokio::test]
    async fn test_search_outage_keeps_rag_prompt() {
        let search = MockSearch::failing();

        let prompt = composer(memory_history())
            .compose(search.as_ref(), "What is the dose?", true, "ALL", None, None)
            .await;

        assert!(prompt.text.contains("<context>"));
        assert!(prompt.cited_paths.is_empty());
    }
}

mod answer {
    use super::*;

    #[tokio::test]
    async fn test_successful_turn_is_recorded() {
        let search = MockSearch::with_paths(&["b.pdf", "a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::Answer("Give 10 units.")]);
        let history = memory_history();
        let assistant =
            assistant_with(MockConnector::new(search, llm.clone()), history.clone());

        let request = AnswerRequest::new("How much insulin?").with_user("u1", None);
        let result = assistant.answer(&request).await;

        assert_eq!(result.answer, "Give 10 units.");
        assert_eq!(result.related_documents, vec!["a.pdf", "b.pdf"]);
        assert_eq!(result.suggested_questions.len(), 4);
        assert_eq!(
            result.suggested_questions[0],
            "How is insulin stored on the ward?"
        );

        let stored = history.recent("u1", None, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].answer, "Give 10 units.");
        assert_eq!(stored[0].model_name, "llama3.3-70b");
        assert_eq!(stored[0].related_documents, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_prior_turns_reach_the_prompt() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![
            Reply::Answer("Jane Doe."),
            Reply::Answer("Aspirin."),
        ]);
        let assistant =
            assistant_with(MockConnector::new(search, llm.clone()), memory_history());

        assistant
            .answer(&AnswerRequest::new("Who is the patient?").with_user("u1", None))
            .await;
        assistant
            .answer(&AnswerRequest::new("What is she taking?").with_user("u1", None))
            .await;

        let prompt = llm.last_prompt();
        assert!(prompt.contains("Q1: Who is the patient?\nA1: Jane Doe."));
    }

    #[tokio::test]
    async fn test_auth_expiry_retries_once() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::AuthExpired, Reply::Answer("Recovered.")]);
        let connector = MockConnector::new(search, llm.clone());
        let assistant = assistant_with(connector.clone(), memory_history());

        let result = assistant.answer(&AnswerRequest::new("What is the dose?")).await;

        assert_eq!(result.answer, "Recovered.");
        assert_eq!(result.related_documents, vec!["a.pdf"]);
        assert_eq!(llm.call_count(), 2);
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_retry_recomposes_with_fresh_session() {
        let stale = MockSearch::expired();
        let fresh = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::AuthExpired, Reply::Answer("Recovered.")]);
        let connector = MockConnector::rotating(stale.clone(), fresh.clone(), llm.clone());
        let assistant = assistant_with(connector, memory_history());

        let result = assistant.answer(&AnswerRequest::new("What is the dose?")).await;

        assert_eq!(result.answer, "Recovered.");
        assert_eq!(result.related_documents, vec!["a.pdf"]);
        assert!(llm.last_prompt().contains("[Document 1] a.pdf (clinical)"));
        assert_eq!(stale.call_count(), 1);
        assert_eq!(fresh.call_count(), 1);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_auth_expiry_is_connection_failure() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::AuthExpired, Reply::AuthExpired]);
        let assistant =
            assistant_with(MockConnector::new(search, llm.clone()), memory_history());

        let result = assistant.answer(&AnswerRequest::new("What is the dose?")).await;

        assert_eq!(result.answer, CONNECTION_FAILURE_ANSWER);
        assert!(result.related_documents.is_empty());
        assert_eq!(result.suggested_questions, fallback_questions());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_reconnect_is_connection_failure() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::AuthExpired]);
        let connector = MockConnector::connect_once(search, llm.clone());
        let assistant = assistant_with(connector, memory_history());

        let result = assistant.answer(&AnswerRequest::new("What is the dose?")).await;

        assert_eq!(result.answer, CONNECTION_FAILURE_ANSWER);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generic_failure_does_not_retry() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::Fail]);
        let connector = MockConnector::new(search, llm.clone());
        let history = memory_history();
        let assistant = assistant_with(connector.clone(), history.clone());

        let result = assistant
            .answer(&AnswerRequest::new("What is the dose?").with_user("u1", None))
            .await;

        assert_eq!(result.answer, GENERIC_FAILURE_ANSWER);
        assert!(result.related_documents.is_empty());
        assert_eq!(result.suggested_questions, fallback_questions());
        assert_eq!(result.suggested_questions.len(), 4);
        assert_eq!(llm.call_count(), 1);
        assert_eq!(connector.connect_count(), 1);
        assert!(history.recent("u1", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_after_reconnect_is_generic() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::AuthExpired, Reply::Fail]);
        let assistant =
            assistant_with(MockConnector::new(search, llm.clone()), memory_history());

        let result = assistant.answer(&AnswerRequest::new("What is the dose?")).await;

        assert_eq!(result.answer, GENERIC_FAILURE_ANSWER);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_history_outage_does_not_fail_answer() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::Answer("Fine.")]);
        let connector = MockConnector::new(search, llm.clone());
        let assistant = assistant_with(connector, Arc::new(BrokenHistory));

        let result = assistant
            .answer(&AnswerRequest::new("What is the dose?").with_user("u1", None))
            .await;

        assert_eq!(result.answer, "Fine.");
        // Composition fell back, so nothing was cited
        assert!(result.related_documents.is_empty());
        assert_eq!(llm.last_prompt(), PLAIN_PROMPT);
    }

    #[tokio::test]
    async fn test_model_override_and_plain_mode() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::Answer("Plain.")]);
        let history = memory_history();
        let connector = MockConnector::new(search.clone(), llm.clone());
        let assistant = assistant_with(connector, history.clone());

        let request = AnswerRequest::new("What is the dose?")
            .with_rag(false)
            .with_model("mistral-large")
            .with_user("u1", Some("org1".to_string()));
        let result = assistant.answer(&request).await;

        assert_eq!(result.answer, "Plain.");
        assert_eq!(search.call_count(), 0);
        let stored = history.recent("u1", Some("org1"), 1).await.unwrap();
        assert_eq!(stored[0].model_name, "mistral-large");
    }
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn test_suggest_is_distinct_and_sized() {
        let search = MockSearch::with_paths(&[]);
        let connector = MockConnector::new(search, MockLlm::scripted(vec![]));
        let assistant = assistant_with(connector, memory_history());

        let questions = assistant.suggest("insulin", None).await;
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.ends_with('?')));
        for (i, a) in questions.iter().enumerate() {
            for b in questions.iter().skip(i + 1) {
                assert!(!is_similar(a, b));
            }
        }

        let wards = assistant.suggest("discharge", Some("wards")).await;
        assert_eq!(wards, fallback_questions());
    }

    #[tokio::test]
    async fn test_history_and_stats() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![Reply::Answer("One."), Reply::Answer("Two.")]);
        let assistant = assistant_with(MockConnector::new(search, llm), memory_history());

        assistant
            .answer(&AnswerRequest::new("First question?").with_user("u1", None))
            .await;
        assistant
            .answer(
                &AnswerRequest::new("Second question?")
                    .with_category("pharmacy")
                    .with_user("u1", None),
            )
            .await;

        let history = assistant.history("u1", None, 10).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "Second question?");

        let stats = assistant.stats("u1", None).await;
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.categories, vec!["ALL", "pharmacy"]);
        assert!(stats.first_interaction <= stats.last_interaction);
    }

    #[tokio::test]
    async fn test_reporting_degrades_when_store_is_down() {
        let search = MockSearch::with_paths(&[]);
        let connector = MockConnector::new(search, MockLlm::scripted(vec![]));
        let assistant = assistant_with(connector, Arc::new(BrokenHistory));

        assert!(assistant.history("u1", None, 10).await.is_empty());
        assert_eq!(assistant.stats("u1", None).await.total_questions, 0);
    }

    #[tokio::test]
    async fn test_raw_context_and_catalog() {
        let search = MockSearch::with_paths(&["a.pdf", "b.pdf"]);
        let assistant = assistant_with(
            MockConnector::new(search.clone(), MockLlm::scripted(vec![])),
            memory_history(),
        );

        let context = assistant.raw_context("insulin", None, None).await;
        assert_eq!(context.results.len(), 2);
        assert!(context.error.is_none());

        assert_eq!(assistant.categories().await, vec!["ALL", "pharmacy", "wards"]);
        assert_eq!(assistant.documents().await, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_raw_context_never_fails() {
        let assistant = assistant_with(
            MockConnector::new(MockSearch::failing(), MockLlm::scripted(vec![])),
            memory_history(),
        );

        let context = assistant.raw_context("insulin", Some("pharmacy"), Some(5)).await;
        assert!(context.results.is_empty());
        assert!(context.error.is_some());
    }

    #[tokio::test]
    async fn test_local_operations_work_while_auth_is_down() {
        let search = MockSearch::with_paths(&["a.pdf"]);
        let llm = MockLlm::scripted(vec![]);
        let connector = MockConnector::offline(search.clone(), llm.clone());
        let history = memory_history();
        let assistant = assistant_with(connector.clone(), history.clone());

        assert_eq!(assistant.categories().await, vec!["ALL", "pharmacy", "wards"]);
        assert_eq!(assistant.documents().await, vec!["a.pdf", "b.pdf"]);
        assert!(assistant.history("u1", None, 10).await.is_empty());
        assert_eq!(assistant.stats("u1", None).await.total_questions, 0);
        assert_eq!(assistant.suggest("insulin", None).await.len(), 4);
        assert_eq!(connector.connect_count(), 0);

        let result = assistant
            .answer(&AnswerRequest::new("What is the dose?").with_user("u1", None))
            .await;
        assert_eq!(result.answer, CONNECTION_FAILURE_ANSWER);
        assert_eq!(result.suggested_questions, fallback_questions());
        assert_eq!(llm.call_count(), 0);
        assert!(history.recent("u1", None, 10).await.unwrap().is_empty());

        assert!(assistant.raw_context("insulin", None, None).await.is_failed());
        assert_eq!(search.call_count(), 0);
    }
}
