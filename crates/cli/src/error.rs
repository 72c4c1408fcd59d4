//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Neither a config file nor both raw inputs were given
    #[error("no inputs: pass --config or both --bif and --ahcal")]
    MissingInputs,

    /// Input file does not exist
    #[error("{stream} input not found: {}", .path.display())]
    InputNotFound { stream: String, path: PathBuf },

    /// `--output` extension does not name a known format
    #[error("cannot infer output format from '{}' (use .csv or .jsonl)", .path.display())]
    UnknownOutputFormat { path: PathBuf },
}

impl CliError {
    pub fn input_not_found(stream: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound {
            stream: stream.into(),
            path: path.into(),
        }
    }
}
