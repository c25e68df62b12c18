//! # helpsync CLI (`hsync`)
//!
//! The `hsync` binary drives the daily help-center → vector index
//! synchronization job.
//!
//! ## Usage
//!
//! ```bash
//! hsync --config ./config/helpsync.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hsync init` | Create the SQLite record database and schema |
//! | `hsync sync` | Fetch articles, upload what changed, log the run |
//! | `hsync status` | Show record counts and the last run summary |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the record database
//! hsync init --config ./config/helpsync.toml
//!
//! # Preview what a run would upload, without writing anything
//! hsync sync --dry-run
//!
//! # Run the daily sync (the cron entry point)
//! hsync sync
//!
//! # Re-upload everything regardless of stored fingerprints
//! hsync sync --full
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpsync::{config, migrate, status, sync};

/// helpsync CLI — a daily help-center to vector-search index
/// synchronization job.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/helpsync.example.toml` for a full
/// example. The index API key is read from the `OPENAI_API_KEY`
/// environment variable (a `.env` file is honored).
#[derive(Parser)]
#[command(
    name = "hsync",
    about = "helpsync — keep a vector-search index current with a help center",
    version,
    long_about = "helpsync fetches help-center articles, detects new or changed content by \
    fingerprint comparison, chunks changed articles into overlapping segments, and uploads \
    only the changes to a managed vector store, recording an auditable per-run report."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/helpsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the record database schema.
    ///
    /// Creates the SQLite database file and the articles table.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Run one synchronization pass.
    ///
    /// Fetches the current article batch, classifies each article as
    /// added/updated/skipped against the stored fingerprints, uploads
    /// the changed ones, and appends a report to the run log.
    Sync {
        /// Ignore stored fingerprints — re-upload every fetched article.
        #[arg(long)]
        full: bool,

        /// Show the plan and estimated segment counts without uploading
        /// or writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of articles to process this run.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show record counts and the most recent run summary.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync {
            full,
            dry_run,
            limit,
        } => {
            sync::run_sync(&cfg, full, dry_run, limit).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
    }

    Ok(())
}
