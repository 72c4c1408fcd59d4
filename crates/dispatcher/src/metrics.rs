//! Per-sink counters

/// Counters for a single sink
#[derive(Debug, Default, Clone)]
pub struct SinkMetrics {
    write_count: u64,
    failure_count: u64,
    discard_count: u64,
    discarded_rows: u64,
    rows_since_discard: u64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written successfully
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    pub fn inc_write_count(&mut self) {
        self.write_count += 1;
        self.rows_since_discard += 1;
    }

    /// Failed writes
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn inc_failure_count(&mut self) {
        self.failure_count += 1;
    }

    /// Number of discards (one per resync)
    pub fn discard_count(&self) -> u64 {
        self.discard_count
    }

    /// Record a discard of everything written since the previous one
    pub fn record_discard(&mut self) {
        self.discard_count += 1;
        self.discarded_rows += self.rows_since_discard;
        self.rows_since_discard = 0;
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count,
            failure_count: self.failure_count,
            discard_count: self.discard_count,
            discarded_rows: self.discarded_rows,
            retained_rows: self.rows_since_discard,
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
    pub discard_count: u64,
    pub discarded_rows: u64,
    /// Rows currently held by the sink
    pub retained_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_accounting() {
        let mut metrics = SinkMetrics::new();
        for _ in 0..20 {
            metrics.inc_write_count();
        }
        metrics.record_discard();
        for _ in 0..5 {
            metrics.inc_write_count();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_count, 25);
        assert_eq!(snapshot.discard_count, 1);
        assert_eq!(snapshot.discarded_rows, 20);
        assert_eq!(snapshot.retained_rows, 5);
    }
}
