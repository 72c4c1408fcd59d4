//! TriggerRecord - decoder output
//!
//! One decoded trigger from either hardware stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded trigger record
///
/// Both decoders produce this shape; only the meaning of the timestamp
/// resolution differs between streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// Hardware tick count (BIF: 48-bit tick << 5 | correction, AHCAL: 48-bit tick)
    pub fine_timestamp: u64,

    /// Hardware trigger sequence number
    pub trigger_count: u32,

    /// Reconstructed acquisition / readout cycle
    pub cycle: u32,
}

/// First-seen values of a BIF stream
///
/// BIF trigger numbers and shutter counters are meaningful only relative
/// to the first values observed after the stream was opened (or rewound).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Trigger counter of the first trigger frame
    pub trigger_count: Option<u32>,

    /// Shutter counter after the first shutter frame
    pub cycle: Option<u32>,
}

impl Baseline {
    /// Trigger number relative to the first-seen trigger counter
    #[inline]
    pub fn relative_trigger(&self, trigger_count: u32) -> u32 {
        trigger_count.wrapping_sub(self.trigger_count.unwrap_or(0))
    }

    /// One-based cycle number relative to the first-seen shutter counter
    #[inline]
    pub fn relative_cycle(&self, cycle: u32) -> i32 {
        cycle
            .wrapping_sub(self.cycle.unwrap_or(0))
            .wrapping_add(1) as i32
    }
}

/// Identifies one of the two hardware streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Beam instrumentation (trigger) stream
    Bif,
    /// Calorimeter readout stream
    Ahcal,
}

impl StreamKind {
    /// Lowercase label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Bif => "bif",
            StreamKind::Ahcal => "ahcal",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_values_without_baseline() {
        let baseline = Baseline::default();
        assert_eq!(baseline.relative_trigger(42), 42);
        assert_eq!(baseline.relative_cycle(0), 1);
    }

    #[test]
    fn test_relative_values_with_baseline() {
        let baseline = Baseline {
            trigger_count: Some(1000),
            cycle: Some(4094),
        };
        assert_eq!(baseline.relative_trigger(1003), 3);
        assert_eq!(baseline.relative_cycle(4096), 3);
    }

    #[test]
    fn test_relative_trigger_wraps() {
        let baseline = Baseline {
            trigger_count: Some(u32::MAX),
            cycle: None,
        };
        assert_eq!(baseline.relative_trigger(1), 2);
    }
}
