//! Correlation metrics
//!
//! Thin recording functions over the `metrics` facade plus an in-memory
//! aggregator used for the end-of-run summary.

use contracts::{RowKind, StreamKind};
use metrics::{counter, gauge, histogram};
use serde::Serialize;

/// Record one emitted merged row
///
/// `residual` is the deviation of a matched pair from the established
/// offset, in coarse ticks.
pub fn record_row(kind: RowKind, residual: Option<i64>) {
    counter!("beam_correlator_rows_total", "kind" => kind.as_str()).increment(1);
    if let Some(residual) = residual {
        histogram!("beam_correlator_match_residual_ticks").record(residual as f64);
    }
}

/// Record a resynchronization
pub fn record_resync(resync_index: u32) {
    counter!("beam_correlator_resyncs_total").increment(1);
    gauge!("beam_correlator_resync_index").set(f64::from(resync_index));
}

/// Record the offset established after a (re)seed
pub fn record_time_offset(offset: i64) {
    gauge!("beam_correlator_time_offset_ticks").set(offset as f64);
}

/// Record a final decoder snapshot for one stream
pub fn record_decoder_stream(stream: StreamKind, records: u64, skipped: u64, cycle_anomalies: u64) {
    let label = stream.as_str();
    gauge!("beam_correlator_stream_records", "stream" => label).set(records as f64);
    gauge!("beam_correlator_stream_skipped", "stream" => label).set(skipped as f64);
    gauge!("beam_correlator_stream_cycle_anomalies", "stream" => label)
        .set(cycle_anomalies as f64);
}

/// Record a row handed to a sink
pub fn record_row_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "beam_correlator_rows_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Correlation statistics aggregator
///
/// Aggregates rows of the current alignment pass in memory.
#[derive(Debug, Clone, Default)]
pub struct CorrelationStatsAggregator {
    /// Rows emitted
    pub total_rows: u64,

    /// Rows pairing both streams
    pub matched: u64,

    /// Rows with a BIF trigger only
    pub bif_only: u64,

    /// Rows with an AHCAL trigger only
    pub ahcal_only: u64,

    /// Residual of matched pairs (coarse ticks)
    pub residual_stats: RunningStats,
}

impl CorrelationStatsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one emitted row
    pub fn update(&mut self, kind: RowKind, residual: Option<i64>) {
        self.total_rows += 1;
        match kind {
            RowKind::Matched => self.matched += 1,
            RowKind::BifOnly => self.bif_only += 1,
            RowKind::AhcalOnly => self.ahcal_only += 1,
        }
        if let Some(residual) = residual {
            self.residual_stats.push(residual as f64);
        }
    }

    /// Summary of the rows seen so far
    pub fn summary(&self) -> CorrelationMetricsSummary {
        CorrelationMetricsSummary {
            total_rows: self.total_rows,
            matched: self.matched,
            bif_only: self.bif_only,
            ahcal_only: self.ahcal_only,
            match_rate: if self.total_rows > 0 {
                self.matched as f64 / self.total_rows as f64 * 100.0
            } else {
                0.0
            },
            residual_ticks: StatsSummary::from(&self.residual_stats),
        }
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Correlation metrics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationMetricsSummary {
    pub total_rows: u64,
    pub matched: u64,
    pub bif_only: u64,
    pub ahcal_only: u64,
    pub match_rate: f64,
    pub residual_ticks: StatsSummary,
}

impl std::fmt::Display for CorrelationMetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Correlation Metrics Summary ===")?;
        writeln!(f, "Total rows: {}", self.total_rows)?;
        writeln!(f, "Matched: {} ({:.2}%)", self.matched, self.match_rate)?;
        writeln!(f, "BIF only: {}", self.bif_only)?;
        writeln!(f, "AHCAL only: {}", self.ahcal_only)?;
        writeln!(f, "Match residual (ticks): {}", self.residual_ticks)
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean / variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
