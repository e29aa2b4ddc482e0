//! Suggested follow-up question mining.
//!
//! Questions are lifted verbatim from indexed document text: chunks that
//! contain a `?` are split into sentences, and short question sentences are
//! kept unless they near-duplicate one already chosen. The static fallback
//! list fills any gap.

pub mod fallback;
pub mod sentences;
pub mod similarity;

pub use fallback::fallback_questions;
pub use sentences::split_sentences;
pub use similarity::is_similar;

use crate::catalog::DocumentCatalog;
use medrag_core::config::MAX_SUGGESTED_QUESTIONS;
use medrag_core::AppResult;
use std::sync::Arc;

/// Mined questions must be strictly longer than this, in characters.
const MIN_QUESTION_CHARS: usize = 10;

/// Mined questions must be strictly shorter than this, in characters.
const MAX_QUESTION_CHARS: usize = 100;

/// Produces suggested follow-up questions from the document catalog.
pub struct SuggestionMiner {
    catalog: Arc<dyn DocumentCatalog>,
    scan_limit: usize,
}

impl SuggestionMiner {
    /// Create a miner scanning at most `scan_limit` chunks per call.
    pub fn new(catalog: Arc<dyn DocumentCatalog>, scan_limit: usize) -> Self {
        Self {
            catalog,
            scan_limit,
        }
    }

    /// Exactly `min_count` distinct questions for `category`.
    ///
    /// `min_count` is capped at the size of the fallback list, the most that
    /// can always be guaranteed. Never fails; catalog errors yield the
    /// fallback list.
    pub async fn mine(&self, question: &str, category: &str, min_count: usize) -> Vec<String> {
        let min_count = min_count.min(MAX_SUGGESTED_QUESTIONS);
        tracing::debug!(
            "Mining {} suggested questions for '{}' (category: {})",
            min_count,
            question,
            category
        );

        match self.collect(category, min_count).await {
            Ok(mined) => pad_with_fallback(mined, min_count),
            Err(e) => {
                tracing::warn!("Question mining failed, using fallback questions: {}", e);
                fallback_questions().into_iter().take(min_count).collect()
            }
        }
    }

    async fn collect(&self, category: &str, min_count: usize) -> AppResult<Vec<String>> {
        let mut kept: Vec<String> = Vec::new();
        if min_count == 0 {
            return Ok(kept);
        }

        let candidates = self
            .catalog
            .question_candidates(category, self.scan_limit)
            .await?;

        for text in &candidates {
            for sentence in split_sentences(text) {
                let sentence = sentence.trim();
                if !is_question(sentence) {
                    continue;
                }
                if kept.iter().any(|existing| is_similar(existing, sentence)) {
                    continue;
                }

                kept.push(sentence.to_string());
                if kept.len() >= min_count {
                    return Ok(kept);
                }
            }
        }

        tracing::debug!(
            "Mined {} of {} questions from {} chunks",
            kept.len(),
            min_count,
            candidates.len()
        );
        Ok(kept)
    }
}

fn is_question(sentence: &str) -> bool {
    let chars = sentence.chars().count();
    sentence.ends_with('?') && chars > MIN_QUESTION_CHARS && chars < MAX_QUESTION_CHARS
}

/// Top up `mined` to `min_count` with fallback questions it does not already cover.
///
/// When the non-overlapping fallbacks run out, the plain fallback list is
/// used instead so the count and distinctness guarantees both hold.
fn pad_with_fallback(mut mined: Vec<String>, min_count: usize) -> Vec<String> {
    for candidate in fallback_questions() {
        if mined.len() >= min_count {
            break;
        }
        if !mined.iter().any(|existing| is_similar(existing, &candidate)) {
            mined.push(candidate);
        }
    }

    if mined.len() < min_count {
        return fallback_questions().into_iter().take(min_count).collect();
    }

    mined.truncate(min_count);
    mined
}
