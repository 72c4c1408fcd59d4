//! CsvSink - merged rows in the legacy combined-table layout

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use contracts::{ContractError, MergedRow, RowSink};
use tracing::{debug, error, info, instrument};

/// Column names of the combined table
pub const CSV_HEADER: [&str; 6] = ["ROC", "bif_Trig", "ahc_Trig", "bif_Time", "dwc_Trig", "dwc_Time"];

/// Writes one CSV line per merged row
///
/// Absent triggers are written as `4294967295`. Rows without a series entry
/// leave the two `dwc_*` columns empty.
pub struct CsvSink {
    name: String,
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: u64,
}

impl CsvSink {
    /// Create the output file (truncating) and write the header
    pub fn create(name: impl Into<String>, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = Self::open(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            writer,
            rows: 0,
        })
    }

    /// Create from sink params (`path` required)
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> io::Result<Self> {
        let path = super::path_param(params)?;
        Self::create(name, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows currently in the file
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn open(path: &Path) -> io::Result<csv::Writer<File>> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        Ok(writer)
    }

    fn record(row: &MergedRow) -> [String; 6] {
        let (dwc_event, dwc_time) = match row.dwc {
            Some(entry) => (entry.event_id.to_string(), entry.time_since_start.to_string()),
            None => (String::new(), String::new()),
        };
        [
            row.cycle.to_string(),
            row.bif_trigger_raw().to_string(),
            row.ahcal_trigger_raw().to_string(),
            row.bif_time.to_string(),
            dwc_event,
            dwc_time,
        ]
    }

    fn write_error(&self, e: impl std::fmt::Display) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl RowSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        self.writer
            .write_record(Self::record(row))
            .map_err(|e| self.write_error(e))?;
        self.rows += 1;
        Ok(())
    }

    #[instrument(name = "csv_sink_discard", skip(self), fields(sink = %self.name, rows = self.rows))]
    fn discard(&mut self) -> Result<(), ContractError> {
        // drain the old buffer before truncating so nothing lands past the new header
        self.writer.flush().map_err(|e| self.write_error(e))?;
        self.writer = Self::open(&self.path).map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Failed to reopen CSV output");
            self.write_error(e)
        })?;
        self.rows = 0;
        debug!(sink = %self.name, "CSV output truncated");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer.flush().map_err(|e| self.write_error(e))
    }

    #[instrument(name = "csv_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        self.flush()?;
        info!(sink = %self.name, path = %self.path.display(), rows = self.rows, "CsvSink closed");
        Ok(())
    }
}
