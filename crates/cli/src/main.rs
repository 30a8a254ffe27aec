//! # Classify Dispatch CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Settings and credential loading
//! - One-shot event handling against the filesystem object store
//! - Registry listing and settings validation

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use commands::{run_handle, run_targets, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        "Classify Dispatch CLI starting"
    );

    let result = match &cli.command {
        Commands::Handle(args) => run_handle(args).await,
        Commands::Targets(args) => run_targets(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let (level, force_level) = if cli.quiet {
        ("warn", true)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, false)
    };

    let metrics_port = match &cli.command {
        Commands::Handle(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: level.to_string(),
        force_level,
    })
}
