//! TimeSeries trait - supplementary pre-correlated event table
//!
//! The correlation engine only walks this series row by row to bound the
//! number of emitted rows and to pass its values through; it never
//! interprets them.

use serde::{Deserialize, Serialize};

/// One row of the supplementary series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Event number assigned by the external system
    #[serde(alias = "event")]
    pub event_id: u32,

    /// Time since start of the external run
    #[serde(alias = "timeSinceStart")]
    pub time_since_start: i64,
}

/// Indexed, read-only access to a finite ordered series
pub trait TimeSeries {
    /// Total number of rows
    fn len(&self) -> usize;

    /// Row at `index`, `None` past the end
    fn entry(&self, index: usize) -> Option<SeriesEntry>;

    /// Whether the series has no rows
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory series
#[derive(Debug, Clone, Default)]
pub struct VecSeries {
    entries: Vec<SeriesEntry>,
}

impl VecSeries {
    /// Wrap already loaded entries
    pub fn new(entries: Vec<SeriesEntry>) -> Self {
        Self { entries }
    }

    /// Series of `len` rows numbered from zero with zero time
    pub fn sequential(len: usize) -> Self {
        Self::new(
            (0..len)
                .map(|i| SeriesEntry {
                    event_id: i as u32,
                    time_since_start: 0,
                })
                .collect(),
        )
    }
}

impl TimeSeries for VecSeries {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Option<SeriesEntry> {
        self.entries.get(index).copied()
    }
}

impl<T: TimeSeries + ?Sized> TimeSeries for Box<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn entry(&self, index: usize) -> Option<SeriesEntry> {
        (**self).entry(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_series_access() {
        let series = VecSeries::sequential(3);
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.entry(2).map(|e| e.event_id), Some(2));
        assert_eq!(series.entry(3), None);
    }

    #[test]
    fn test_entry_accepts_legacy_names() {
        let entry: SeriesEntry =
            serde_json::from_str(r#"{"event": 5, "timeSinceStart": -12}"#).unwrap();
        assert_eq!(entry.event_id, 5);
        assert_eq!(entry.time_since_start, -12);
    }
}
