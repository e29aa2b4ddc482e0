//! Category and document listing handlers.

use super::{print_json, print_list};
use clap::Args;
use medrag_assistant::Assistant;

/// List document categories
#[derive(Args, Debug)]
pub struct CategoriesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CategoriesCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        let categories = assistant.categories().await;

        if self.json {
            return print_json(&categories);
        }

        print_list("Categories", &categories);
        Ok(())
    }
}

/// List indexed documents
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocumentsCommand {
    pub async fn execute(self, assistant: &Assistant) -> anyhow::Result<()> {
        let documents = assistant.documents().await;

        if self.json {
            return print_json(&documents);
        }

        print_list("Documents", &documents);
        Ok(())
    }
}
