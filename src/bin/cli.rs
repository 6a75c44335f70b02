//! eventsync CLI
//!
//! Local execution entry point. For AWS Lambda, use `eventsync-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eventsync::{error::Result, models::Config, pipeline};

/// eventsync - scheduled event catalog reconciliation
#[derive(Parser, Debug)]
#[command(name = "eventsync", version, about = "Mirrors a ticketing feed into Supabase")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "eventsync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one reconciliation pass
    Run,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Run => {
            pipeline::run_sync(&config).await?;
        }
        Command::Validate => {
            config.validate()?;
            println!("Configuration OK");
        }
    }

    Ok(())
}
