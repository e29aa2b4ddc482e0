//! History command handler.

use super::print_json;
use clap::Args;
use medrag_assistant::Assistant;

/// Show a user's recent questions
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// User whose history to show
    #[arg(short, long)]
    pub user: String,

    /// Organisation of the user
    #[arg(long)]
    pub org: Option<String>,

    /// Maximum number of turns
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        tracing::info!("Executing history command");

        let turns = assistant
            .history(&self.user, self.org.as_deref(), self.limit)
            .await;

        if self.json {
            return print_json(&turns);
        }

        if turns.is_empty() {
            println!("No history for {}", self.user);
            return Ok(());
        }

        for turn in &turns {
            println!(
                "[{}] ({}) {}",
                turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
                turn.category,
                turn.question
            );
            println!("    {}\n", turn.answer);
        }

        Ok(())
    }
}
