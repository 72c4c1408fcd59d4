//! Decoder and correlation engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

/// Decoder configuration for both hardware streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// BIF decoder settings
    #[serde(flatten)]
    pub bif: BifDecoderConfig,

    /// AHCAL decoder settings
    #[serde(flatten)]
    pub ahcal: AhcalDecoderConfig,
}

/// BIF decoder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BifDecoderConfig {
    /// Shutter counter the decoder starts from
    #[serde(default, rename = "bif_initial_cycle")]
    pub initial_cycle: u32,
}

/// AHCAL decoder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhcalDecoderConfig {
    /// Readout cycle the decoder starts from
    #[serde(default, rename = "ahcal_initial_cycle")]
    pub initial_cycle: u32,

    /// Period of the hardware cycle field (power of two)
    #[serde(default = "default_cycle_modulo", rename = "ahcal_cycle_modulo")]
    pub cycle_modulo: u32,

    /// Tolerated backward slip of the cycle field on start-acquisition packets
    #[serde(default = "default_max_backwards", rename = "ahcal_max_backwards")]
    pub max_backwards: u32,

    /// Largest plausible cycle increment on a trigger packet
    #[serde(
        default = "default_max_cycle_increment",
        rename = "ahcal_max_cycle_increment"
    )]
    pub max_cycle_increment: u32,
}

fn default_cycle_modulo() -> u32 {
    256
}

fn default_max_backwards() -> u32 {
    10
}

fn default_max_cycle_increment() -> u32 {
    50
}

impl Default for AhcalDecoderConfig {
    fn default() -> Self {
        Self {
            initial_cycle: 0,
            cycle_modulo: default_cycle_modulo(),
            max_backwards: default_max_backwards(),
            max_cycle_increment: default_max_cycle_increment(),
        }
    }
}

/// How the match window decides that the alignment is wrong
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Evaluate the last `window_size` rows after every row
    #[default]
    Sliding,
    /// Evaluate once, when the first `window_size` rows after a (re)seed are in
    Leading,
}

/// Correlation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Rows in the match window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Matched rows a full window needs to keep the current alignment
    #[serde(default = "default_min_matched")]
    pub min_matched: usize,

    /// Allowed deviation (coarse ticks) from the established offset
    #[serde(default = "default_tolerance_ticks")]
    pub tolerance_ticks: i64,

    /// Sub-tick correction bits at the bottom of BIF fine timestamps
    #[serde(default = "default_fine_time_bits")]
    pub fine_time_bits: u32,

    /// Resynchronization attempts before giving up (None = unbounded)
    #[serde(default = "default_max_resyncs")]
    pub max_resyncs: Option<u32>,

    /// Match window evaluation mode
    #[serde(default)]
    pub window_mode: WindowMode,
}

fn default_window_size() -> usize {
    20
}

fn default_min_matched() -> usize {
    11
}

fn default_tolerance_ticks() -> i64 {
    1
}

fn default_fine_time_bits() -> u32 {
    5
}

fn default_max_resyncs() -> Option<u32> {
    Some(64)
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_matched: default_min_matched(),
            tolerance_ticks: default_tolerance_ticks(),
            fine_time_bits: default_fine_time_bits(),
            max_resyncs: default_max_resyncs(),
            window_mode: WindowMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_defaults() {
        let config = CorrelationConfig::default();
        assert_eq!(config.window_size, 20);
        assert_eq!(config.min_matched, 11);
        assert_eq!(config.tolerance_ticks, 1);
        assert_eq!(config.fine_time_bits, 5);
        assert_eq!(config.max_resyncs, Some(64));
        assert_eq!(config.window_mode, WindowMode::Sliding);
    }

    #[test]
    fn test_decoder_config_flat_keys() {
        let config: DecoderConfig = toml::from_str(
            r#"
bif_initial_cycle = 3
ahcal_max_cycle_increment = 40
"#,
        )
        .unwrap();
        assert_eq!(config.bif.initial_cycle, 3);
        assert_eq!(config.ahcal.max_cycle_increment, 40);
        assert_eq!(config.ahcal.cycle_modulo, 256);
        assert_eq!(config.ahcal.max_backwards, 10);
    }
}
