//! AHCAL stream decoder
//!
//! Packets are located by scanning for the two-byte sync marker `0xCD 0xCD`,
//! followed by three 8-byte blocks:
//!
//! ```text
//! header     10 00 <cycle> .. .. .. .. 08   (bytes 0..2 = payload length)
//! emit       'E' 'M' 'I' 'T' <type> .. <trigger id, u16>
//! timestamp  <48-bit timestamp> AB AB
//! ```
//!
//! Anything that does not fit this shape is skipped and scanning resumes.

use std::io::{Read, Seek, SeekFrom};

use contracts::{AhcalDecoderConfig, StreamKind, TriggerRecord};
use tracing::{debug, trace, warn};

use crate::counter::update_counter_modulo;
use crate::field::{read_block, read_u16_le, read_u48_le, FRAME_LEN};
use crate::{DecoderStats, Result, TriggerSource};

const SYNC_BYTE: u8 = 0xCD;
const HEADER_TAG: [u8; 2] = [0x10, 0x00];
const HEADER_TRAILER: u8 = 0x08;
const EMIT_MAGIC: &[u8; 4] = b"EMIT";
const TIMESTAMP_MARKER: [u8; 2] = [0xAB, 0xAB];

const PACKET_START_ACQUISITION: u8 = 0x01;
const PACKET_STOP_ACQUISITION: u8 = 0x02;
const PACKET_TRIGGER: u8 = 0x10;

/// AHCAL decoder
pub struct AhcalDecoder<R> {
    stream: R,
    config: AhcalDecoderConfig,
    cycle: u32,
    stats: DecoderStats,
}

impl<R: Read + Seek> AhcalDecoder<R> {
    /// Create a decoder positioned at the current stream position
    pub fn new(stream: R, config: AhcalDecoderConfig) -> Self {
        let cycle = config.initial_cycle;
        Self {
            stream,
            config,
            cycle,
            stats: DecoderStats::default(),
        }
    }

    /// Current reconstructed readout cycle
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Consume the decoder and return the underlying stream
    pub fn into_inner(self) -> R {
        self.stream
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        Ok(read_block(&mut self.stream, &mut byte)?.then_some(byte[0]))
    }

    /// Advance past the next `0xCD 0xCD` pair; `false` at end of stream
    fn find_sync(&mut self) -> Result<bool> {
        loop {
            match self.read_byte()? {
                None => return Ok(false),
                Some(SYNC_BYTE) => {}
                Some(_) => continue,
            }
            match self.read_byte()? {
                None => return Ok(false),
                Some(SYNC_BYTE) => return Ok(true),
                Some(_) => continue,
            }
        }
    }

    fn skip(&mut self, len: i64) -> Result<()> {
        self.stream.seek(SeekFrom::Current(len))?;
        Ok(())
    }

    fn accept_trigger(&mut self, narrow_cycle: u32) {
        // cycle_modulo is a power of two
        let mask = self.config.cycle_modulo.wrapping_sub(1);
        let increment = narrow_cycle.wrapping_sub(self.cycle) & mask;
        if increment > self.config.max_cycle_increment {
            self.stats.record_cycle_anomaly(StreamKind::Ahcal);
            warn!(
                previous = self.cycle,
                narrow_cycle,
                increment,
                "Implausible AHCAL cycle increment, accepting"
            );
        }
        self.cycle = self.cycle.wrapping_add(increment);
    }
}

impl<R: Read + Seek> TriggerSource for AhcalDecoder<R> {
    fn kind(&self) -> StreamKind {
        StreamKind::Ahcal
    }

    fn next_record(&mut self) -> Result<Option<TriggerRecord>> {
        let mut block = [0u8; FRAME_LEN];
        loop {
            if !self.find_sync()? {
                return Ok(None);
            }

            if !read_block(&mut self.stream, &mut block)? {
                return Ok(None);
            }
            self.stats.record_frame(StreamKind::Ahcal);
            if block[..2] != HEADER_TAG || block[7] != HEADER_TRAILER {
                let length = read_u16_le(&block, 0);
                trace!(length, "Skipping foreign AHCAL packet");
                self.stats.record_skipped(StreamKind::Ahcal);
                self.skip(i64::from(length))?;
                continue;
            }
            let narrow_cycle = u32::from(block[2]);

            if !read_block(&mut self.stream, &mut block)? {
                return Ok(None);
            }
            if &block[..4] != EMIT_MAGIC {
                trace!("AHCAL packet without EMIT block");
                self.stats.record_skipped(StreamKind::Ahcal);
                self.skip(FRAME_LEN as i64)?;
                continue;
            }
            let packet_type = block[4];
            let trigger_id = u32::from(read_u16_le(&block, 6));

            if !read_block(&mut self.stream, &mut block)? {
                return Ok(None);
            }
            if block[6..8] != TIMESTAMP_MARKER {
                trace!("AHCAL packet with bad timestamp marker");
                self.stats.record_skipped(StreamKind::Ahcal);
                continue;
            }
            let timestamp = read_u48_le(&block, 0);

            match packet_type {
                PACKET_START_ACQUISITION => {
                    self.cycle = update_counter_modulo(
                        self.cycle,
                        narrow_cycle,
                        self.config.cycle_modulo,
                        self.config.max_backwards,
                    );
                    debug!(cycle = self.cycle, timestamp, "AHCAL start acquisition");
                }
                PACKET_STOP_ACQUISITION => {}
                PACKET_TRIGGER => {
                    self.accept_trigger(narrow_cycle);
                    self.stats.record_trigger(StreamKind::Ahcal);
                    return Ok(Some(TriggerRecord {
                        fine_timestamp: timestamp,
                        trigger_count: trigger_id,
                        cycle: self.cycle,
                    }));
                }
                other => trace!(packet_type = other, "Ignoring AHCAL packet type"),
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.stream.rewind()?;
        self.cycle = self.config.initial_cycle;
        self.stats = DecoderStats::default();
        Ok(())
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}
