//! TriggerSource trait
//!
//! Seam between the stream decoders and the correlation engine.

use contracts::{Baseline, StreamKind, TriggerRecord};

use crate::{DecoderStats, Result};

/// Sequential, rewindable source of decoded trigger records
pub trait TriggerSource {
    /// Which hardware stream this source decodes
    fn kind(&self) -> StreamKind;

    /// Next trigger record, `Ok(None)` at end of stream
    fn next_record(&mut self) -> Result<Option<TriggerRecord>>;

    /// Seek back to the start of the stream and reset all decode state
    fn rewind(&mut self) -> Result<()>;

    /// First-seen reference values since the last (re)start
    fn baseline(&self) -> Baseline {
        Baseline::default()
    }

    /// Decode counters since the last (re)start
    fn stats(&self) -> DecoderStats;
}

impl<S: TriggerSource + ?Sized> TriggerSource for &mut S {
    fn kind(&self) -> StreamKind {
        (**self).kind()
    }

    fn next_record(&mut self) -> Result<Option<TriggerRecord>> {
        (**self).next_record()
    }

    fn rewind(&mut self) -> Result<()> {
        (**self).rewind()
    }

    fn baseline(&self) -> Baseline {
        (**self).baseline()
    }

    fn stats(&self) -> DecoderStats {
        (**self).stats()
    }
}
