//! CSV-backed supplementary series

use std::path::Path;

use contracts::{ContractError, SeriesEntry, TimeSeries};
use tracing::{debug, instrument};

/// Supplementary series loaded from a CSV file
///
/// Expected columns are `event,timeSinceStart` (or `event_id,time_since_start`).
/// Extra columns are ignored.
#[derive(Debug, Clone, Default)]
pub struct CsvSeries {
    entries: Vec<SeriesEntry>,
}

impl CsvSeries {
    /// Load the whole file into memory
    #[instrument(name = "series_load", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ContractError::series_load(path.display().to_string(), e.to_string()))?;
        let series = Self::from_csv_reader(reader)
            .map_err(|e| ContractError::series_load(path.display().to_string(), e.to_string()))?;
        debug!(rows = series.entries.len(), "Series loaded");
        Ok(series)
    }

    /// Parse CSV from any reader (header row required)
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ContractError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv_reader(reader).map_err(|e| ContractError::series_load("<reader>", e.to_string()))
    }

    fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> csv::Result<Self> {
        let entries = reader
            .deserialize::<SeriesEntry>()
            .collect::<csv::Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

impl TimeSeries for CsvSeries {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Option<SeriesEntry> {
        self.entries.get(index).copied()
    }
}
