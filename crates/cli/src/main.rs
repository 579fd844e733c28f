//! HopRAG CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config
//! - `ask`      — Answer a single question
//! - `chat`     — Interactive question answering
//! - `batch`    — Answer every question in a file
//! - `kb`       — Set up, fill, search and inspect the knowledge base
//! - `doctor`   — Diagnose system health

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod render;
mod session;

#[derive(Parser)]
#[command(
    name = "hoprag",
    about = "HopRAG — multi-hop retrieval-augmented question answering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the similarity threshold (0.0 - 1.0)
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Override the maximum number of retrieve/analyze rounds
    #[arg(long, global = true)]
    max_iterations: Option<u32>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Answer a single question
    Ask {
        /// The question to answer
        query: String,
    },

    /// Ask questions interactively
    Chat,

    /// Answer every question in a file (one per line)
    Batch {
        /// File with one question per line
        file: PathBuf,

        /// Write the results to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the knowledge base
    Kb {
        #[command(subcommand)]
        action: KbAction,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum KbAction {
    /// Rebuild the knowledge base from a documents path, or the demo corpus
    Setup {
        /// File or directory of .txt/.md documents
        #[arg(long)]
        docs_path: Option<PathBuf>,
    },

    /// Add a file or directory of documents
    Add {
        path: PathBuf,
    },

    /// Search the knowledge base directly
    Search {
        query: String,
    },

    /// Remove every passage
    Clear {
        /// Required to actually clear
        #[arg(long)]
        confirm: bool,
    },

    /// Show knowledge base statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for results
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = session::RunOptions {
        threshold: cli.threshold,
        max_iterations: cli.max_iterations,
        json: cli.json,
    };

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { query } => commands::ask::run(&query, &options).await?,
        Commands::Chat => commands::chat::run(&options).await?,
        Commands::Batch { file, output } => {
            commands::batch::run(&file, output.as_deref(), &options).await?
        }
        Commands::Kb { action } => match action {
            KbAction::Setup { docs_path } => {
                commands::kb::setup(docs_path.as_deref()).await?
            }
            KbAction::Add { path } => commands::kb::add(&path).await?,
            KbAction::Search { query } => commands::kb::search(&query, &options).await?,
            KbAction::Clear { confirm } => commands::kb::clear(confirm).await?,
            KbAction::Stats => commands::kb::stats(&options).await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
