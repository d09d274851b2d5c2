//! Ferry CLI - migrate GitHub repository history between hosts.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Ferry - migrate issues, pull requests, and releases between repositories
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source GitHub repo (format: owner/repo)
    #[arg(long)]
    source_repo: String,

    /// Destination GitHub repo (format: owner/repo)
    #[arg(long)]
    dest_repo: String,

    /// Access token for the source repo
    #[arg(long)]
    source_token: String,

    /// Access token for the destination repo
    #[arg(long)]
    dest_token: String,

    /// Source API base URL (for GHES or EMU instances)
    #[arg(long, default_value = ferry_core::DEFAULT_API_URL)]
    source_api_url: String,

    /// Destination API base URL (for GHES or EMU instances)
    #[arg(long, default_value = ferry_core::DEFAULT_API_URL)]
    dest_api_url: String,

    /// Advisory limit for concurrent asset transfers
    #[arg(long, default_value_t = 5)]
    max_transfers: usize,

    /// Log intended changes without performing any
    #[arg(long)]
    dry_run: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Migrate labels, issues, and pull requests
    Issues,

    /// Migrate releases and their assets
    Releases,

    /// Migrate everything: labels, history, then releases
    All,
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> anyhow::Result<()> {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ferry_core={log_level},ferry_cli={log_level}").into());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::sync::Arc::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut config = ferry_core::MigrationConfig::new(&cli.source_repo, &cli.dest_repo)
        .with_source_token(&cli.source_token)
        .with_dest_token(&cli.dest_token)
        .with_source_api_url(&cli.source_api_url)
        .with_dest_api_url(&cli.dest_api_url)
        .with_dry_run(cli.dry_run);
    config.max_transfers = cli.max_transfers;

    let result = match cli.command {
        Commands::Issues => commands::issues(&config).await,
        Commands::Releases => commands::releases(&config).await,
        Commands::All => commands::all(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
