//! Pipeline statistics.

use std::time::Duration;

use correlation::CorrelationSummary;
use dispatcher::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Engine summary of the final alignment pass
    pub summary: CorrelationSummary,

    /// Per-sink counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Wall time of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Rows of the final pass per second of wall time
    pub fn rows_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.rows.total_rows as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let rows = &self.summary.rows;

        println!("\n=== Correlation Statistics ===\n");
        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Total rows: {}", rows.total_rows);
        println!("   Rows/s: {:.0}", self.rows_per_sec());
        println!("   Matched: {} ({:.2}%)", rows.matched, rows.match_rate);
        println!("   BIF only: {}", rows.bif_only);
        println!("   AHCAL only: {}", rows.ahcal_only);
        println!(
            "   Resyncs: {} ({} rows discarded)",
            self.summary.resyncs, self.summary.rows_discarded
        );
        println!("   Anomalies: {}", self.summary.anomalies());
        match self.summary.time_offset {
            Some(offset) => println!("   Time offset: {offset} ticks"),
            None => println!("   Time offset: N/A"),
        }
        println!("   Match residual (ticks): {}", rows.residual_ticks);

        println!("\nDecoders");
        for (name, stats) in [("BIF", &self.summary.bif), ("AHCAL", &self.summary.ahcal)] {
            println!(
                "   {name}: {} records, {} frames, {} skipped",
                stats.records, stats.frames, stats.skipped
            );
        }

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (name, metrics) in &self.sinks {
                println!(
                    "   {name}: {} rows kept, {} failures",
                    metrics.retained_rows, metrics.failure_count
                );
            }
        }

        println!();
    }
}
