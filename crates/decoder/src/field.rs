//! Little-endian field readers
//!
//! Multi-byte hardware fields are assembled byte by byte, never by
//! reinterpreting the buffer. Callers guarantee `offset + width <= bytes.len()`;
//! all frames handled here are fixed 8-byte blocks.

use std::io::{self, Read};

/// Size of every BIF frame and every AHCAL header block
pub const FRAME_LEN: usize = 8;

/// Read a `u16` at `offset`
#[inline]
pub fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from(bytes[offset]) | (u16::from(bytes[offset + 1]) << 8)
}

/// Read a `u32` at `offset`
#[inline]
pub fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from(bytes[offset])
        | (u32::from(bytes[offset + 1]) << 8)
        | (u32::from(bytes[offset + 2]) << 16)
        | (u32::from(bytes[offset + 3]) << 24)
}

/// Read a 48-bit value at `offset` into the low bits of a `u64`
#[inline]
pub fn read_u48_le(bytes: &[u8], offset: usize) -> u64 {
    (0..6).fold(0u64, |acc, i| acc | (u64::from(bytes[offset + i]) << (8 * i)))
}

/// Read a `u64` at `offset`
#[inline]
pub fn read_u64_le(bytes: &[u8], offset: usize) -> u64 {
    (0..8).fold(0u64, |acc, i| acc | (u64::from(bytes[offset + i]) << (8 * i)))
}

/// Fill `buf` completely from `reader`
///
/// Returns `Ok(false)` when the stream ends before `buf` is full; a
/// truncated trailing block is treated as end of stream.
pub fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const BYTES: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x88];

    #[test]
    fn test_field_widths() {
        assert_eq!(read_u16_le(&BYTES, 0), 0x0201);
        assert_eq!(read_u16_le(&BYTES, 6), 0x8807);
        assert_eq!(read_u32_le(&BYTES, 0), 0x0403_0201);
        assert_eq!(read_u32_le(&BYTES, 4), 0x8807_0605);
        assert_eq!(read_u48_le(&BYTES, 0), 0x0605_0403_0201);
        assert_eq!(read_u64_le(&BYTES, 0), 0x8807_0605_0403_0201);
    }

    #[test]
    fn test_matches_std_from_le_bytes() {
        assert_eq!(read_u32_le(&BYTES, 2), u32::from_le_bytes([3, 4, 5, 6]));
        assert_eq!(read_u64_le(&BYTES, 0), u64::from_le_bytes(BYTES));
    }

    #[test]
    fn test_read_block_truncated_is_end() {
        let mut reader = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; FRAME_LEN];
        assert!(!read_block(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn test_read_block_full() {
        let mut reader = Cursor::new(BYTES.to_vec());
        let mut buf = [0u8; FRAME_LEN];
        assert!(read_block(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, BYTES);
        assert!(!read_block(&mut reader, &mut buf).unwrap());
    }
}
