//! Decoder statistics

use contracts::StreamKind;
use serde::Serialize;

/// Per-stream decode counters
///
/// Mirrored to the global metrics registry as they are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames (BIF) or packets (AHCAL) read
    pub frames: u64,

    /// Trigger records produced
    pub records: u64,

    /// Frames or packets discarded as foreign or malformed
    pub skipped: u64,

    /// Implausible cycle increments that were accepted anyway
    pub cycle_anomalies: u64,
}

impl DecoderStats {
    pub(crate) fn record_frame(&mut self, kind: StreamKind) {
        self.frames += 1;
        metrics::counter!("beam_correlator_decoder_frames_total", "stream" => kind.as_str())
            .increment(1);
    }

    pub(crate) fn record_trigger(&mut self, kind: StreamKind) {
        self.records += 1;
        metrics::counter!("beam_correlator_decoder_records_total", "stream" => kind.as_str())
            .increment(1);
    }

    pub(crate) fn record_skipped(&mut self, kind: StreamKind) {
        self.skipped += 1;
        metrics::counter!("beam_correlator_decoder_skipped_total", "stream" => kind.as_str())
            .increment(1);
    }

    pub(crate) fn record_cycle_anomaly(&mut self, kind: StreamKind) {
        self.cycle_anomalies += 1;
        metrics::counter!("beam_correlator_decoder_cycle_anomalies_total", "stream" => kind.as_str())
            .increment(1);
    }
}
