//! Command handlers for the medrag CLI.

pub mod ask;
pub mod catalog;
pub mod context;
pub mod history;
pub mod stats;
pub mod suggest;

pub use ask::AskCommand;
pub use catalog::{CategoriesCommand, DocumentsCommand};
pub use context::ContextCommand;
pub use history::HistoryCommand;
pub use stats::StatsCommand;
pub use suggest::SuggestCommand;

use anyhow::Context;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print a titled list, one entry per line.
pub(crate) fn print_list(title: &str, items: &[String]) {
    println!("{}:", title);
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  - {}", item);
    }
}
