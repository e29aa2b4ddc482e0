//! Prompt composition.
//!
//! Turns a question into the text sent to the completion model. With RAG
//! enabled the prompt embeds retrieved passages and the user's recent turns
//! inside the clinical instruction template; patient separation is enforced
//! by those instructions, not by filtering here. Any failure while gathering
//! context degrades to the plain question prompt.

use crate::history::HistoryStore;
use crate::retrieval::{ContextRetriever, RetrievedChunk, SearchResult, SearchService};
use crate::types::ConversationTurn;
use medrag_core::{AppError, AppResult};
use medrag_prompt::{build_prompt, PromptLibrary, PLAIN_ANSWER_ID, RAG_ANSWER_ID};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A prompt plus the documents whose passages it embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub text: String,
    pub cited_paths: BTreeSet<String>,
}

/// Assembles prompts from retrieval results and conversation history.
pub struct PromptComposer {
    retriever: ContextRetriever,
    library: PromptLibrary,
    history: Arc<dyn HistoryStore>,
    num_chunks: usize,
    history_turns: usize,
}

impl PromptComposer {
    pub fn new(
        retriever: ContextRetriever,
        library: PromptLibrary,
        history: Arc<dyn HistoryStore>,
        num_chunks: usize,
        history_turns: usize,
    ) -> Self {
        Self {
            retriever,
            library,
            history,
            num_chunks,
            history_turns,
        }
    }

    /// Build the prompt for `question`. Never fails.
    pub async fn compose(
        &self,
        search: &dyn SearchService,
        question: &str,
        use_rag: bool,
        category: &str,
        user_id: Option<&str>,
        org_id: Option<&str>,
    ) -> ComposedPrompt {
        if !use_rag {
            return self.plain(question);
        }

        match self
            .compose_with_context(search, question, category, user_id, org_id)
            .await
        {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Falling back to context-free prompt: {}", e);
                self.plain(question)
            }
        }
    }

    async fn compose_with_context(
        &self,
        search: &dyn SearchService,
        question: &str,
        category: &str,
        user_id: Option<&str>,
        org_id: Option<&str>,
    ) -> AppResult<ComposedPrompt> {
        let retrieved = self
            .retriever
            .fetch(search, question, category, self.num_chunks)
            .await?;

        let turns = match user_id {
            Some(user_id) => {
                self.history
                    .recent(user_id, org_id, self.history_turns)
                    .await?
            }
            None => Vec::new(),
        };

        tracing::debug!(
            "Composing prompt with {} chunks and {} prior turns",
            retrieved.results.len(),
            turns.len()
        );

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), render_context(&retrieved));
        variables.insert("history".to_string(), render_history(&turns));

        let definition = self.library.get(RAG_ANSWER_ID).ok_or_else(|| {
            AppError::Prompt(format!("Prompt template '{}' is not loaded", RAG_ANSWER_ID))
        })?;
        let built = build_prompt(definition, &variables)?;

        tracing::debug!(
            "Composed prompt '{}' from {:?}:\n{}",
            built.metadata.source_prompt_id,
            built.metadata.resolved_variables,
            built.text
        );

        Ok(ComposedPrompt {
            text: built.text,
            cited_paths: retrieved.cited_paths(),
        })
    }

    /// The question-only prompt.
    fn plain(&self, question: &str) -> ComposedPrompt {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());

        let rendered = self
            .library
            .get(PLAIN_ANSWER_ID)
            .map(|def| build_prompt(def, &variables));

        let text = match rendered {
            Some(Ok(built)) => built.text,
            Some(Err(e)) => {
                tracing::warn!("Plain prompt template failed to render: {}", e);
                plain_text(question)
            }
            None => plain_text(question),
        };

        ComposedPrompt {
            text,
            cited_paths: BTreeSet::new(),
        }
    }
}

fn plain_text(question: &str) -> String {
    format!("Question:\n{}\nAnswer: ", question)
}

/// Numbered passages with their source and category.
fn render_context(retrieved: &SearchResult) -> String {
    retrieved
        .results
        .iter()
        .enumerate()
        .map(|(i, chunk)| render_chunk(i + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_chunk(n: usize, chunk: &RetrievedChunk) -> String {
    let source = if chunk.relative_path.is_empty() {
        "unknown source"
    } else {
        chunk.relative_path.as_str()
    };

    if chunk.category.is_empty() {
        format!("[Document {}] {}\n{}\n", n, source, chunk.chunk)
    } else {
        format!("[Document {}] {} ({})\n{}\n", n, source, chunk.category, chunk.chunk)
    }
}

/// Prior turns as numbered Q/A pairs, most recent first.
fn render_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| format!("Q{n}: {}\nA{n}: {}\n", turn.question, turn.answer, n = i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SqliteHistoryStore;
    use chrono::Utc;

    fn chunk(text: &str, path: &str, category: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: text.to_string(),
            relative_path: path.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_render_context() {
        let retrieved = SearchResult {
            results: vec![
                chunk("Metformin 500mg", "a.pdf", "pharmacy"),
                chunk("Bed 4", "", ""),
            ],
            error: None,
        };

        let rendered = render_context(&retrieved);
        assert!(rendered.contains("[Document 1] a.pdf (pharmacy)\nMetformin 500mg"));
        assert!(rendered.contains("[Document 2] unknown source\nBed 4"));
    }

    #[test]
    fn test_render_history() {
        let turn = ConversationTurn {
            user_id: "u1".to_string(),
            org_id: None,
            question: "Who is the patient?".to_string(),
            answer: "Jane Doe".to_string(),
            model_name: "m".to_string(),
            category: "ALL".to_string(),
            related_documents: Vec::new(),
            suggested_questions: Vec::new(),
            timestamp: Utc::now(),
        };

        assert_eq!(
            render_history(&[turn]),
            "Q1: Who is the patient?\nA1: Jane Doe\n"
        );
        assert_eq!(render_history(&[]), "");
    }

    #[test]
    fn test_plain_prompt() {
        let composer = PromptComposer::new(
            ContextRetriever::new(&Default::default()),
            PromptLibrary::builtin(),
            Arc::new(SqliteHistoryStore::open_in_memory(true).unwrap()),
            3,
            3,
        );

        let prompt = composer.plain("What is the dose?");
        assert_eq!(prompt.text, "Question:\nWhat is the dose?\nAnswer: ");
        assert!(prompt.cited_paths.is_empty());
    }
}
