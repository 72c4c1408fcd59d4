//! RunBlueprint - Config Loader output
//!
//! Describes one correlation run: the input files, decoder and engine
//! tuning, and the output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{CorrelationConfig, DecoderConfig};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input files
    pub inputs: InputsConfig,

    /// Decoder tuning
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Correlation engine tuning
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl RunBlueprint {
    /// Blueprint with default tuning and no sinks
    pub fn from_inputs(bif: PathBuf, ahcal: PathBuf, dwc: Option<PathBuf>) -> Self {
        Self {
            version: ConfigVersion::V1,
            inputs: InputsConfig { bif, ahcal, dwc },
            decoder: DecoderConfig::default(),
            correlation: CorrelationConfig::default(),
            sinks: Vec::new(),
        }
    }
}

/// Input file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputsConfig {
    /// BIF raw data file
    pub bif: PathBuf,

    /// AHCAL raw data file
    pub ahcal: PathBuf,

    /// Supplementary series (CSV with `event,timeSinceStart` columns)
    #[serde(default)]
    pub dwc: Option<PathBuf>,
}

/// Sink output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// File-backed sink writing to `path`
    pub fn file(name: impl Into<String>, sink_type: SinkType, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::from([("path".to_string(), path.into())]),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// CSV table
    Csv,
    /// One JSON object per line
    Jsonl,
    /// Log output
    Log,
}

impl SinkType {
    /// Whether the sink writes to a file given by the `path` param
    pub fn is_file_backed(&self) -> bool {
        matches!(self, SinkType::Csv | SinkType::Jsonl)
    }

    /// Infer a file sink type from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            _ => None,
        }
    }
}
