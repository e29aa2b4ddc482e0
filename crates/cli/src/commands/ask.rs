//! Ask command handler.

use super::{print_json, print_list};
use clap::Args;
use medrag_assistant::{AnswerRequest, Assistant, ALL_CATEGORIES};

/// Ask a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Restrict retrieval to one document category
    #[arg(long, default_value = ALL_CATEGORIES)]
    pub category: String,

    /// Answer without retrieved context or history
    #[arg(long)]
    pub no_rag: bool,

    /// User the turn is recorded for
    #[arg(short, long)]
    pub user: Option<String>,

    /// Organisation of the user
    #[arg(long, requires = "user")]
    pub org: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let mut request = AnswerRequest::new(self.question)
            .with_rag(!self.no_rag)
            .with_category(self.category);
        if let Some(user) = self.user {
            request = request.with_user(user, self.org);
        }

        let result = assistant.answer(&request).await;

        if self.json {
            return print_json(&result);
        }

        println!("{}\n", result.answer);
        if !result.related_documents.is_empty() {
            print_list("Sources", &result.related_documents);
            println!();
        }
        print_list("Suggested questions", &result.suggested_questions);

        Ok(())
    }
}
