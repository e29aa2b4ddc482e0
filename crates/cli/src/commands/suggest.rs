//! Suggest command handler.

use super::{print_json, print_list};
use clap::Args;
use medrag_assistant::Assistant;
use serde_json::json;

/// Suggest follow-up questions
#[derive(Args, Debug)]
pub struct SuggestCommand {
    /// Question the suggestions follow
    pub question: String,

    /// Restrict mining to one document category
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        tracing::info!("Executing suggest command");

        let questions = assistant
            .suggest(&self.question, self.category.as_deref())
            .await;

        if self.json {
            return print_json(&json!({ "suggested_questions": questions }));
        }

        print_list("Suggested questions", &questions);
        Ok(())
    }
}
