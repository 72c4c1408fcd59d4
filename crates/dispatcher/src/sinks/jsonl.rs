//! JsonLinesSink - one JSON object per merged row

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, MergedRow, RowSink};
use tracing::{info, instrument};

/// Writes merged rows as JSON lines
pub struct JsonLinesSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn create(name: impl Into<String>, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self {
            name: name.into(),
            path,
            writer,
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

    fn write_error(&self, e: impl std::fmt::Display) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl RowSink for JsonLinesSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        serde_json::to_writer(&mut self.writer, row).map_err(|e| self.write_error(e))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[instrument(name = "jsonl_sink_discard", skip(self), fields(sink = %self.name))]
    fn discard(&mut self) -> Result<(), ContractError> {
        self.writer.flush()?;
        self.writer = BufWriter::new(File::create(&self.path)?);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer.flush()?;
        Ok(())
    }

    #[instrument(name = "jsonl_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        self.flush()?;
        info!(sink = %self.name, path = %self.path.display(), "JsonLinesSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let row = MergedRow {
            cycle: 3,
            bif_trigger: Some(5),
            ahcal_trigger: None,
            bif_time: 900,
            dwc: None,
        };

        let mut sink = JsonLinesSink::create("jsonl", &path).unwrap();
        sink.write(&row).unwrap();
        sink.discard().unwrap();
        sink.write(&row).unwrap();
        sink.write(&MergedRow { cycle: 4, ..row }).unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<MergedRow> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row);
        assert_eq!(rows[1].cycle, 4);
    }
}
