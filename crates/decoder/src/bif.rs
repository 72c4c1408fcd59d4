//! BIF stream decoder
//!
//! The BIF stream is a flat sequence of 8-byte little-endian frames:
//!
//! ```text
//! bytes 0..6   48-bit coarse timestamp
//! bytes 6..8   bits 0..12 detail field, bits 12..16 packet subtype
//! ```
//!
//! Subtypes 0 and 1 are trigger headers followed by one data frame holding
//! the trigger counter (bytes 0..4) and a phase byte (byte 4). Subtype 2 is
//! a continuation and subtype 3 carries the low 12 bits of the shutter
//! counter in its detail field.

use std::io::{Read, Seek};

use contracts::{Baseline, BifDecoderConfig, StreamKind, TriggerRecord};
use tracing::{debug, trace};

use crate::field::{read_block, read_u16_le, read_u32_le, read_u48_le, FRAME_LEN};
use crate::{DecodeError, DecoderStats, Result, TriggerSource};

const SUBTYPE_TRIGGER_RISING: u8 = 0;
const SUBTYPE_TRIGGER_FALLING: u8 = 1;
const SUBTYPE_CONTINUATION: u8 = 2;
const SUBTYPE_SHUTTER: u8 = 3;

const DETAIL_MASK: u16 = 0x0FFF;
const SHUTTER_FIELD_MODULO: u64 = 0x1000;

/// Phase offset added to the raw phase byte before masking
const PHASE_OFFSET: u8 = 0x18;
const PHASE_MASK: u8 = 0x1F;
const PHASE_BITS: u32 = 5;

/// Parsed BIF frame header
#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    coarse_time: u64,
    detail: u16,
    subtype: u8,
}

impl FrameHeader {
    fn parse(frame: &[u8; FRAME_LEN]) -> Self {
        Self {
            coarse_time: read_u48_le(frame, 0),
            detail: read_u16_le(frame, 6) & DETAIL_MASK,
            subtype: frame[7] >> 4,
        }
    }
}

/// BIF decoder
///
/// Tracks the shutter counter across frames and records the first trigger
/// counter and shutter counter it sees as the stream [`Baseline`].
pub struct BifDecoder<R> {
    stream: R,
    config: BifDecoderConfig,
    shutter: u64,
    last_shutter_field: u16,
    baseline: Baseline,
    stats: DecoderStats,
}

impl<R: Read + Seek> BifDecoder<R> {
    /// Create a decoder positioned at the current stream position
    pub fn new(stream: R, config: BifDecoderConfig) -> Self {
        let shutter = u64::from(config.initial_cycle);
        Self {
            stream,
            config,
            shutter,
            last_shutter_field: (shutter % SHUTTER_FIELD_MODULO) as u16,
            baseline: Baseline::default(),
            stats: DecoderStats::default(),
        }
    }

    /// Current reconstructed shutter counter
    pub fn shutter_count(&self) -> u64 {
        self.shutter
    }

    /// Consume the decoder and return the underlying stream
    pub fn into_inner(self) -> R {
        self.stream
    }

    fn reset_state(&mut self) {
        self.shutter = u64::from(self.config.initial_cycle);
        self.last_shutter_field = (self.shutter % SHUTTER_FIELD_MODULO) as u16;
        self.baseline = Baseline::default();
        self.stats = DecoderStats::default();
    }

    /// Fold a 12-bit shutter field into the wide shutter counter
    fn update_shutter(&mut self, field: u16) {
        if self.last_shutter_field == DETAIL_MASK && field == 0 {
            self.shutter += SHUTTER_FIELD_MODULO;
        }
        self.shutter = (self.shutter & !(SHUTTER_FIELD_MODULO - 1)) | u64::from(field);
        self.last_shutter_field = field;
        if self.baseline.cycle.is_none() {
            self.baseline.cycle = Some(self.shutter as u32);
            debug!(shutter = self.shutter, "BIF shutter baseline captured");
        }
    }

    fn frame_offset(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?.saturating_sub(FRAME_LEN as u64))
    }
}

impl<R: Read + Seek> TriggerSource for BifDecoder<R> {
    fn kind(&self) -> StreamKind {
        StreamKind::Bif
    }

    fn next_record(&mut self) -> Result<Option<TriggerRecord>> {
        let mut frame = [0u8; FRAME_LEN];
        loop {
            if !read_block(&mut self.stream, &mut frame)? {
                return Ok(None);
            }
            self.stats.record_frame(StreamKind::Bif);
            let header = FrameHeader::parse(&frame);

            match header.subtype {
                SUBTYPE_TRIGGER_RISING | SUBTYPE_TRIGGER_FALLING => {
                    if !read_block(&mut self.stream, &mut frame)? {
                        trace!("BIF stream ends inside a trigger packet");
                        return Ok(None);
                    }
                    self.stats.record_frame(StreamKind::Bif);

                    let trigger_count = read_u32_le(&frame, 0);
                    let phase = frame[4].wrapping_add(PHASE_OFFSET) & PHASE_MASK;
                    if self.baseline.trigger_count.is_none() {
                        self.baseline.trigger_count = Some(trigger_count);
                        debug!(trigger_count, "BIF trigger baseline captured");
                    }

                    self.stats.record_trigger(StreamKind::Bif);
                    return Ok(Some(TriggerRecord {
                        fine_timestamp: (header.coarse_time << PHASE_BITS) | u64::from(phase),
                        trigger_count,
                        cycle: self.shutter as u32,
                    }));
                }
                SUBTYPE_CONTINUATION => continue,
                SUBTYPE_SHUTTER => self.update_shutter(header.detail),
                subtype => {
                    let offset = self.frame_offset()?;
                    return Err(DecodeError::UnknownPacket { subtype, offset });
                }
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.stream.rewind()?;
        self.reset_state();
        Ok(())
    }

    fn baseline(&self) -> Baseline {
        self.baseline
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::BifStreamBuilder;

    fn decode_all<R: Read + Seek>(decoder: &mut BifDecoder<R>) -> Vec<TriggerRecord> {
        std::iter::from_fn(|| decoder.next_record().unwrap()).collect()
    }

    #[test]
    fn test_trigger_frames_decode_in_order() {
        let mut builder = BifStreamBuilder::new().shutter(7);
        for i in 0..5u32 {
            builder = builder.trigger(1_000 + u64::from(i) * 250, 40 + i);
        }
        let mut bif = BifDecoder::new(builder.into_cursor(), BifDecoderConfig::default());

        let records = decode_all(&mut bif);
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.trigger_count, 40 + i as u32);
            assert_eq!(record.fine_timestamp >> 5, 1_000 + i as u64 * 250);
            assert_eq!(record.cycle, 7);
        }
        assert_eq!(bif.baseline().trigger_count, Some(40));
        assert_eq!(bif.baseline().cycle, Some(7));
        assert_eq!(bif.stats().records, 5);
        assert_eq!(bif.stats().frames, 11);
    }

    #[test]
    fn test_phase_correction() {
        let stream = BifStreamBuilder::new()
            .trigger_with_phase(3, 0, 0)
            .trigger_with_phase(3, 1, 17)
            .trigger_with_phase(3, 2, 31)
            .into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig::default());
        let phases: Vec<u64> = decode_all(&mut bif)
            .iter()
            .map(|r| r.fine_timestamp & 0x1F)
            .collect();
        assert_eq!(phases, vec![0, 17, 31]);
    }

    #[test]
    fn test_raw_phase_byte_offset() {
        // raw phase byte 0x08 + 0x18 wraps to a zero correction
        let mut frame = [0u8; FRAME_LEN];
        frame[4] = 0x08;
        assert_eq!(frame[4].wrapping_add(PHASE_OFFSET) & PHASE_MASK, 0);
        frame[4] = 0xF0;
        assert_eq!(frame[4].wrapping_add(PHASE_OFFSET) & PHASE_MASK, 0x08);
    }

    #[test]
    fn test_shutter_rollover() {
        let stream = BifStreamBuilder::new()
            .shutter(4094)
            .trigger(10, 0)
            .shutter(4095)
            .trigger(20, 1)
            .shutter(0)
            .trigger(30, 2)
            .shutter(1)
            .trigger(40, 3)
            .into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig::default());
        let cycles: Vec<u32> = decode_all(&mut bif).iter().map(|r| r.cycle).collect();
        assert_eq!(cycles, vec![4094, 4095, 4096, 4097]);
        assert_eq!(bif.baseline().cycle, Some(4094));
    }

    #[test]
    fn test_trigger_before_shutter_uses_initial_cycle() {
        let stream = BifStreamBuilder::new().trigger(10, 0).into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig { initial_cycle: 9 });
        let record = bif.next_record().unwrap().unwrap();
        assert_eq!(record.cycle, 9);
        assert_eq!(bif.baseline().cycle, None);
    }

    #[test]
    fn test_continuation_frames_are_skipped() {
        let stream = BifStreamBuilder::new()
            .continuation()
            .continuation()
            .trigger(10, 5)
            .continuation()
            .into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig::default());
        assert_eq!(decode_all(&mut bif).len(), 1);
    }

    #[test]
    fn test_unknown_subtype_is_error() {
        let stream = BifStreamBuilder::new()
            .trigger(10, 0)
            .raw_frame(0, 7, 0)
            .into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig::default());
        assert!(bif.next_record().unwrap().is_some());
        match bif.next_record() {
            Err(DecodeError::UnknownPacket { subtype, offset }) => {
                assert_eq!(subtype, 7);
                assert_eq!(offset, 16);
            }
            other => panic!("expected UnknownPacket, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_tail_is_end_of_stream() {
        let mut bytes = BifStreamBuilder::new().trigger(10, 0).build().to_vec();
        bytes.extend_from_slice(&[0u8; 5]);
        let mut bif = BifDecoder::new(std::io::Cursor::new(bytes), BifDecoderConfig::default());
        assert!(bif.next_record().unwrap().is_some());
        assert!(bif.next_record().unwrap().is_none());
    }

    #[test]
    fn test_rewind_replays_and_resets_baseline() {
        let stream = BifStreamBuilder::new()
            .shutter(3)
            .trigger(10, 100)
            .trigger(20, 101)
            .into_cursor();
        let mut bif = BifDecoder::new(stream, BifDecoderConfig::default());
        let first = decode_all(&mut bif);

        bif.rewind().unwrap();
        assert_eq!(bif.baseline(), Baseline::default());
        assert_eq!(bif.stats(), DecoderStats::default());

        let second = decode_all(&mut bif);
        assert_eq!(first, second);
        assert_eq!(bif.baseline().trigger_count, Some(100));
    }

    #[test]
    fn test_empty_stream() {
        let mut bif = BifDecoder::new(std::io::Cursor::new(Vec::new()), BifDecoderConfig::default());
        assert!(bif.next_record().unwrap().is_none());
    }
}
