//! MergedRow - correlation engine output

use serde::{Deserialize, Serialize};

use crate::SeriesEntry;

/// Classification of a merged row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// BIF and AHCAL triggers paired
    Matched,
    /// BIF trigger without an AHCAL partner
    BifOnly,
    /// AHCAL trigger without a BIF partner
    AhcalOnly,
}

impl RowKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Matched => "matched",
            RowKind::BifOnly => "bif_only",
            RowKind::AhcalOnly => "ahcal_only",
        }
    }
}

/// One row of the merged event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRow {
    /// Acquisition cycle (BIF-relative for rows with a BIF trigger)
    pub cycle: i32,

    /// BIF trigger number relative to the first BIF trigger
    pub bif_trigger: Option<u32>,

    /// AHCAL trigger id
    pub ahcal_trigger: Option<u32>,

    /// Time in BIF coarse ticks
    pub bif_time: u64,

    /// Passthrough entry of the supplementary series
    pub dwc: Option<SeriesEntry>,
}

impl MergedRow {
    /// Absent triggers in the legacy numeric encoding
    pub const ABSENT_TRIGGER: u32 = u32::MAX;

    /// Row classification, derived from which triggers are present
    pub fn kind(&self) -> RowKind {
        match (self.bif_trigger, self.ahcal_trigger) {
            (Some(_), Some(_)) => RowKind::Matched,
            (Some(_), None) => RowKind::BifOnly,
            _ => RowKind::AhcalOnly,
        }
    }

    /// BIF trigger with all-ones for "absent"
    #[inline]
    pub fn bif_trigger_raw(&self) -> u32 {
        self.bif_trigger.unwrap_or(Self::ABSENT_TRIGGER)
    }

    /// AHCAL trigger with all-ones for "absent"
    #[inline]
    pub fn ahcal_trigger_raw(&self) -> u32 {
        self.ahcal_trigger.unwrap_or(Self::ABSENT_TRIGGER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bif: Option<u32>, ahcal: Option<u32>) -> MergedRow {
        MergedRow {
            cycle: 1,
            bif_trigger: bif,
            ahcal_trigger: ahcal,
            bif_time: 100,
            dwc: None,
        }
    }

    #[test]
    fn test_kind_from_triggers() {
        assert_eq!(row(Some(1), Some(2)).kind(), RowKind::Matched);
        assert_eq!(row(Some(1), None).kind(), RowKind::BifOnly);
        assert_eq!(row(None, Some(2)).kind(), RowKind::AhcalOnly);
    }

    #[test]
    fn test_raw_sentinel() {
        let r = row(None, Some(7));
        assert_eq!(r.bif_trigger_raw(), u32::MAX);
        assert_eq!(r.ahcal_trigger_raw(), 7);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(row(Some(3), None)).unwrap();
        assert_eq!(json["bif_trigger"], 3);
        assert!(json["ahcal_trigger"].is_null());
    }
}
