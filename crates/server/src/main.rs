//! Copra service entry point.
//!
//! Provides the HTTP question answering server and the document ingestion
//! command.

mod commands;
mod http;

use clap::{Parser, Subcommand};
use commands::{IngestCommand, ServeCommand};
use copra_core::{config::AppConfig, logging, AppResult};

/// Copra - retrieval-augmented question answering over the Code of Practice
#[derive(Parser, Debug)]
#[command(name = "copra")]
#[command(about = "Retrieval-augmented question answering service", long_about = None)]
#[command(version)]
struct Cli {
    /// Bind address for the HTTP server
    #[arg(short, long, global = true, env = "COPRA_BIND_ADDR")]
    bind: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP question answering service
    Serve(ServeCommand),

    /// Ingest the policy document into the vector index
    Ingest(IngestCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.bind, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    }
}
