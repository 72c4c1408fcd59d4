//! Mock raw streams
//!
//! Builders that emit byte-exact BIF and AHCAL streams for tests that run
//! without detector data files.

use std::io::Cursor;

use bytes::{BufMut, Bytes, BytesMut};

const BIF_FRAME_LEN: usize = 8;
const AHCAL_PACKET_LEN: usize = 26;

/// Raw phase byte that decodes to a zero correction
const ZERO_PHASE_RAW: u8 = 0x08;

/// BIF stream builder
#[derive(Debug, Default, Clone)]
pub struct BifStreamBuilder {
    buf: BytesMut,
}

impl BifStreamBuilder {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw frame header
    pub fn raw_frame(mut self, coarse_time: u64, subtype: u8, detail: u16) -> Self {
        self.buf.reserve(BIF_FRAME_LEN);
        self.buf.put_u32_le(coarse_time as u32);
        self.buf.put_u16_le((coarse_time >> 32) as u16);
        self.buf
            .put_u16_le((u16::from(subtype & 0x0F) << 12) | (detail & 0x0FFF));
        self
    }

    /// Append a trigger packet (header + data frame) with zero phase correction
    pub fn trigger(self, coarse_time: u64, trigger_count: u32) -> Self {
        self.trigger_raw_phase(coarse_time, trigger_count, ZERO_PHASE_RAW)
    }

    /// Append a trigger packet whose decoded phase correction is `phase` (0..32)
    pub fn trigger_with_phase(self, coarse_time: u64, trigger_count: u32, phase: u8) -> Self {
        let raw = phase.wrapping_add(ZERO_PHASE_RAW) & 0x1F;
        self.trigger_raw_phase(coarse_time, trigger_count, raw)
    }

    fn trigger_raw_phase(self, coarse_time: u64, trigger_count: u32, raw_phase: u8) -> Self {
        let mut this = self.raw_frame(coarse_time, 0, 0);
        this.buf.put_u32_le(trigger_count);
        this.buf.put_u8(raw_phase);
        this.buf.put_bytes(0, 3);
        this
    }

    /// Append a shutter frame carrying the low 12 bits of the shutter counter
    pub fn shutter(self, field: u16) -> Self {
        self.raw_frame(0, 3, field)
    }

    /// Append a continuation frame
    pub fn continuation(self) -> Self {
        self.raw_frame(0, 2, 0)
    }

    /// Finish and return the stream bytes
    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }

    /// Finish and return a seekable reader over the stream
    pub fn into_cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.buf.to_vec())
    }
}

/// AHCAL stream builder
#[derive(Debug, Default, Clone)]
pub struct AhcalStreamBuilder {
    buf: BytesMut,
}

impl AhcalStreamBuilder {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a well-formed packet
    pub fn packet(self, packet_type: u8, narrow_cycle: u8, trigger_id: u16, timestamp: u64) -> Self {
        self.packet_with_marker(packet_type, narrow_cycle, trigger_id, timestamp, [0xAB, 0xAB])
    }

    fn packet_with_marker(
        mut self,
        packet_type: u8,
        narrow_cycle: u8,
        trigger_id: u16,
        timestamp: u64,
        marker: [u8; 2],
    ) -> Self {
        self.buf.reserve(AHCAL_PACKET_LEN);
        self.buf.put_slice(&[0xCD, 0xCD]);
        // header: payload length 16, cycle, trailer
        self.buf
            .put_slice(&[0x10, 0x00, narrow_cycle, 0, 0, 0, 0, 0x08]);
        self.buf.put_slice(b"EMIT");
        self.buf.put_u8(packet_type);
        self.buf.put_u8(0);
        self.buf.put_u16_le(trigger_id);
        self.buf.put_u32_le(timestamp as u32);
        self.buf.put_u16_le((timestamp >> 32) as u16);
        self.buf.put_slice(&marker);
        self
    }

    /// Append a start-acquisition packet
    pub fn start_acquisition(self, narrow_cycle: u8, timestamp: u64) -> Self {
        self.packet(0x01, narrow_cycle, 0, timestamp)
    }

    /// Append a stop-acquisition packet
    pub fn stop_acquisition(self, narrow_cycle: u8, timestamp: u64) -> Self {
        self.packet(0x02, narrow_cycle, 0, timestamp)
    }

    /// Append a trigger packet
    pub fn trigger(self, narrow_cycle: u8, trigger_id: u16, timestamp: u64) -> Self {
        self.packet(0x10, narrow_cycle, trigger_id, timestamp)
    }

    /// Append a trigger packet with a broken timestamp marker
    pub fn corrupt_trigger(self, narrow_cycle: u8, trigger_id: u16, timestamp: u64) -> Self {
        self.packet_with_marker(0x10, narrow_cycle, trigger_id, timestamp, [0, 0])
    }

    /// Append a synced packet of another kind whose header declares `payload.len()`
    pub fn foreign_packet(mut self, payload: &[u8]) -> Self {
        self.buf.put_slice(&[0xCD, 0xCD]);
        self.buf.put_u16_le(payload.len() as u16);
        self.buf.put_bytes(0, 6);
        self.buf.put_slice(payload);
        self
    }

    /// Append unframed bytes
    pub fn garbage(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Finish and return the stream bytes
    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }

    /// Finish and return a seekable reader over the stream
    pub fn into_cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bif_frame_layout() {
        let bytes = BifStreamBuilder::new()
            .raw_frame(0x0001_0203_0405, 3, 0xABC)
            .build();
        assert_eq!(&bytes[..], &[0x05, 0x04, 0x03, 0x02, 0x01, 0x00, 0xBC, 0x3A]);
    }

    #[test]
    fn test_bif_trigger_is_two_frames() {
        let bytes = BifStreamBuilder::new().trigger(1, 2).build();
        assert_eq!(bytes.len(), 2 * BIF_FRAME_LEN);
        assert_eq!(bytes[8], 2);
        assert_eq!(bytes[12], ZERO_PHASE_RAW);
    }

    #[test]
    fn test_ahcal_packet_layout() {
        let bytes = AhcalStreamBuilder::new().trigger(7, 0x0102, 0x10).build();
        assert_eq!(bytes.len(), AHCAL_PACKET_LEN);
        assert_eq!(&bytes[..4], &[0xCD, 0xCD, 0x10, 0x00]);
        assert_eq!(bytes[4], 7);
        assert_eq!(bytes[9], 0x08);
        assert_eq!(&bytes[10..14], b"EMIT");
        assert_eq!(bytes[14], 0x10);
        assert_eq!(&bytes[16..18], &[0x02, 0x01]);
        assert_eq!(bytes[18], 0x10);
        assert_eq!(&bytes[24..26], &[0xAB, 0xAB]);
    }
}
