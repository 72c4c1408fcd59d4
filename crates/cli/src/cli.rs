//! CLI argument definitions using clap.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Beam Correlator - merges BIF and AHCAL trigger streams
#[derive(Parser, Debug)]
#[command(
    name = "beam-correlator",
    author,
    version,
    about = "BIF / AHCAL trigger time correlation",
    long_about = "Decodes a beam-interface (BIF) trigger stream and a calorimeter (AHCAL)\n\
                  readout stream, aligns both on a constant time offset and writes one\n\
                  merged row per trigger, resynchronizing when the alignment is lost."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BEAM_CORRELATOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BEAM_CORRELATOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Correlate a BIF and an AHCAL file
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Decode a single raw stream and print statistics
    Scan(ScanArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "BEAM_CORRELATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// BIF raw data file (overrides inputs.bif)
    #[arg(short, long)]
    pub bif: Option<PathBuf>,

    /// AHCAL raw data file (overrides inputs.ahcal)
    #[arg(short = 'w', long)]
    pub ahcal: Option<PathBuf>,

    /// Supplementary DWC series, CSV with `event,timeSinceStart` (overrides inputs.dwc)
    #[arg(short, long)]
    pub dwc: Option<PathBuf>,

    /// Output file; `.csv` or `.jsonl` selects the format (default combined.csv without configured sinks)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Validate inputs and configuration, print the plan and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "BEAM_CORRELATOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `scan` command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("stream").required(true).args(["bif", "ahcal"])))]
pub struct ScanArgs {
    /// BIF raw data file
    #[arg(short, long)]
    pub bif: Option<PathBuf>,

    /// AHCAL raw data file
    #[arg(short = 'w', long)]
    pub ahcal: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
