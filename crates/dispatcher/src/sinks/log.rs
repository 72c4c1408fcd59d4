//! LogSink - logs merged rows via tracing

use contracts::{ContractError, MergedRow, RowSink};
use tracing::{info, instrument};

/// Sink that logs every merged row for debugging
pub struct LogSink {
    name: String,
    rows: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: 0,
        }
    }

    fn log_row(&self, row: &MergedRow) {
        info!(
            sink = %self.name,
            kind = row.kind().as_str(),
            cycle = row.cycle,
            bif_trigger = ?row.bif_trigger,
            ahcal_trigger = ?row.ahcal_trigger,
            bif_time = row.bif_time,
            "MergedRow received"
        );
    }
}

impl RowSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        self.log_row(row);
        self.rows += 1;
        Ok(())
    }

    fn discard(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, rows = self.rows, "Earlier rows superseded by resync");
        self.rows = 0;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, rows = self.rows, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let row = MergedRow {
            cycle: 1,
            bif_trigger: Some(0),
            ahcal_trigger: Some(0),
            bif_time: 10,
            dwc: None,
        };

        assert!(sink.write(&row).is_ok());
        assert!(sink.discard().is_ok());
        assert!(sink.close().is_ok());
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
