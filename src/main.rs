//! # Inspection Desk CLI (`desk`)
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/desk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk ask notifications "<query>"` | Ask about the notification records |
//! | `desk ask code "<question>"` | Ask about the building code |
//! | `desk sources` | Show the status of spreadsheet, document, and model |
//! | `desk records` | Print the records as they are sent to the model |
//! | `desk serve` | Start the HTTP API |
//!
//! Answers go to stdout; logs go to stderr (`RUST_LOG` controls verbosity).

use clap::{Parser, Subcommand};
use inspection_desk::resolver::QueryRequest;
use inspection_desk::{ask, config, server, sources};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inspection Desk — ask questions about inspection notifications and the
/// building code.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "Inspection Desk — LLM answers grounded on notification records and the building code",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/desk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and print the answer.
    Ask {
        #[command(subcommand)]
        topic: AskTopic,
    },

    /// Show whether the spreadsheet, document, and model client are usable.
    Sources,

    /// Print loaded notification records as model context.
    Records {
        /// Number of records to print (defaults to `[resolver].record_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum AskTopic {
    /// Ask about the notification records.
    Notifications {
        /// The question.
        query: String,

        /// Restrict the context to the record whose address best matches.
        #[arg(long)]
        address: Option<String>,
    },

    /// Ask about the building code.
    Code {
        /// The question.
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask { topic } => {
            let request = match topic {
                AskTopic::Notifications { query, address } => match address {
                    Some(address) => QueryRequest::notification_at(query, address),
                    None => QueryRequest::notifications(query),
                },
                AskTopic::Code { question } => QueryRequest::building_code(question),
            };
            ask::run_ask(&cfg, request).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Records { limit } => {
            ask::run_records(&cfg, limit)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
