//! ChainGuard CLI - Command-line interface for ChainGuard
//!
//! Loads the risk-scored dataset and relationship graph, then answers
//! lookup, batch, ranking and neighborhood queries by public id, or serves
//! them over WebSocket.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::ChainguardConfig;

#[derive(Parser)]
#[command(name = "chainguard")]
#[command(author = "ChainGuard Contributors")]
#[command(version)]
#[command(about = "Privacy-preserving transaction risk queries", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./chainguard.json, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default chainguard.json
    Init {
        /// Directory to write into (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show configuration and dataset statistics
    Status,

    /// Look up one entity by public id
    Lookup {
        /// Public id
        id: String,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Look up every id in a CSV file
    Batch {
        /// CSV with a secure_id column (txId with --real)
        file: PathBuf,

        /// Treat ids as real transaction ids
        #[arg(long)]
        real: bool,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List the highest-risk entities
    Top {
        /// Number of entities (defaults to default_top_k from config)
        #[arg(short)]
        n: Option<usize>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show the neighborhood of an entity
    Graph {
        /// Public id of the center
        id: String,

        /// Maximum hops to expand
        #[arg(short, long, default_value = "1")]
        depth: usize,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Print a risk report for an entity
    Report {
        /// Public id
        id: String,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Start the ChainGuard server
    Serve {
        /// Port to listen on (defaults to server.port from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Headless mode: bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,
    },
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let load = || ChainguardConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Status => commands::status(&load()?),
        Commands::Lookup { id, json } => commands::lookup(&load()?, &id, json),
        Commands::Batch { file, real, json } => commands::batch(&load()?, &file, real, json),
        Commands::Top { n, json } => commands::top(&load()?, n, json),
        Commands::Graph { id, depth, json } => commands::graph(&load()?, &id, depth, json),
        Commands::Report { id, json } => commands::report(&load()?, &id, json),
        Commands::Serve { port, headless } => commands::serve(&load()?, port, headless).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
