//! Context command handler.

use super::print_json;
use clap::Args;
use medrag_assistant::Assistant;

/// Show the raw passages retrieved for a query
#[derive(Args, Debug)]
pub struct ContextCommand {
    /// Search query
    pub query: String,

    /// Restrict retrieval to one document category
    #[arg(long)]
    pub category: Option<String>,

    /// Number of passages to retrieve
    #[arg(short, long)]
    pub num_chunks: Option<usize>,
}

impl ContextCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        tracing::info!("Executing context command");

        let result = assistant
            .raw_context(&self.query, self.category.as_deref(), self.num_chunks)
            .await;

        if let Some(ref error) = result.error {
            tracing::warn!("Retrieval failed: {}", error);
        }

        print_json(&result)
    }
}
