//! Run summary

use std::fmt;

use decoder::DecoderStats;
use observability::CorrelationMetricsSummary;
use serde::Serialize;

/// Outcome of a correlation run
///
/// Row counts describe the final alignment pass only; rows of abandoned
/// passes are counted in `rows_discarded`.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationSummary {
    /// Rows of the final pass, by kind
    pub rows: CorrelationMetricsSummary,

    /// Rows emitted and then voided by resynchronization
    pub rows_discarded: u64,

    /// Resynchronizations performed
    pub resyncs: u32,

    /// Offset of the final alignment (BIF coarse ticks minus AHCAL ticks)
    pub time_offset: Option<i64>,

    /// BIF decoder counters of the final pass
    pub bif: DecoderStats,

    /// AHCAL decoder counters of the final pass
    pub ahcal: DecoderStats,
}

impl CorrelationSummary {
    /// Cycle-increment anomalies reported by either decoder
    pub fn anomalies(&self) -> u64 {
        self.bif.cycle_anomalies + self.ahcal.cycle_anomalies
    }
}

impl fmt::Display for CorrelationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows)?;
        writeln!(f, "Resyncs: {} ({} rows discarded)", self.resyncs, self.rows_discarded)?;
        match self.time_offset {
            Some(offset) => writeln!(f, "Time offset: {offset} ticks")?,
            None => writeln!(f, "Time offset: N/A")?,
        }
        writeln!(
            f,
            "BIF: {} records, {} frames",
            self.bif.records, self.bif.frames
        )?;
        writeln!(
            f,
            "AHCAL: {} records, {} packets, {} skipped, {} cycle anomalies",
            self.ahcal.records, self.ahcal.frames, self.ahcal.skipped, self.ahcal.cycle_anomalies
        )
    }
}
