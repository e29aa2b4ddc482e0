//! medrag CLI
//!
//! Command-line front end for the clinical document assistant: ask
//! questions, fetch suggestions and inspect conversation history.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, CategoriesCommand, ContextCommand, DocumentsCommand, HistoryCommand,
    StatsCommand, SuggestCommand,
};
use medrag_assistant::Assistant;
use medrag_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// medrag - question answering over clinical documents
#[derive(Parser, Debug)]
#[command(name = "medrag")]
#[command(about = "Retrieval-augmented answers over clinical documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MEDRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question
    Ask(AskCommand),

    /// Suggest follow-up questions
    Suggest(SuggestCommand),

    /// Show a user's recent questions
    History(HistoryCommand),

    /// Show a user's activity summary
    Stats(StatsCommand),

    /// Show the raw passages retrieved for a query
    Context(ContextCommand),

    /// List document categories
    Categories(CategoriesCommand),

    /// List indexed documents
    Documents(DocumentsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Suggest(_) => "suggest",
            Commands::History(_) => "history",
            Commands::Stats(_) => "stats",
            Commands::Context(_) => "context",
            Commands::Categories(_) => "categories",
            Commands::Documents(_) => "documents",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.clone())
        .context("Failed to load configuration")?
        .with_overrides(cli.model, cli.log_level, cli.verbose, cli.no_color);

    logging::init_logging(config.log_level.as_deref(), config.no_color)
        .context("Failed to initialise logging")?;

    tracing::info!("medrag starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Model: {}", config.model);
    tracing::debug!("Database: {:?}", config.storage.database_path);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let assistant = Assistant::from_config(&config).context("Failed to start the assistant")?;

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&assistant).await,
        Commands::Suggest(cmd) => cmd.execute(&assistant).await,
        Commands::History(cmd) => cmd.execute(&assistant).await,
        Commands::Stats(cmd) => cmd.execute(&assistant).await,
        Commands::Context(cmd) => cmd.execute(&assistant).await,
        Commands::Categories(cmd) => cmd.execute(&assistant).await,
        Commands::Documents(cmd) => cmd.execute(&assistant).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
