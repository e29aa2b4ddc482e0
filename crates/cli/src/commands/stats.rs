//! Stats command handler.

use super::print_json;
use clap::Args;
use medrag_assistant::Assistant;

/// Show a user's activity summary
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// User whose activity to summarise
    #[arg(short, long)]
    pub user: String,

    /// Organisation of the user
    #[arg(long)]
    pub org: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let stats = assistant.stats(&self.user, self.org.as_deref()).await;

        if self.json {
            return print_json(&stats);
        }

        println!("Questions asked: {}", stats.total_questions);
        if let (Some(first), Some(last)) = (stats.first_interaction, stats.last_interaction) {
            println!("First question:  {}", first.format("%Y-%m-%d %H:%M:%S"));
            println!("Last question:   {}", last.format("%Y-%m-%d %H:%M:%S"));
        }
        println!(
            "Categories ({}): {}",
            stats.categories_count,
            stats.categories.join(", ")
        );

        Ok(())
    }
}
