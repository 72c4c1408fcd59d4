//! # Beam Correlator CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Correlation runs over BIF / AHCAL raw files
//! - Single-stream decode statistics

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_pipeline, run_scan, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Beam correlator starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Scan(args) => run_scan(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Map CLI verbosity flags onto the subscriber configuration
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let (level, force) = if cli.quiet {
        ("warn", true)
    } else {
        match cli.verbose {
            0 => ("info", false),
            1 => ("debug", true),
            _ => ("trace", true),
        }
    };

    ObservabilityConfig {
        log_format: match cli.log_format {
            cli::LogFormat::Json => LogFormat::Json,
            cli::LogFormat::Pretty => LogFormat::Pretty,
            cli::LogFormat::Compact => LogFormat::Compact,
        },
        metrics_port: None,
        default_log_level: level.to_string(),
        force_level: force,
    }
}
