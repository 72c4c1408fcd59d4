//! Decoder error types

use thiserror::Error;

/// Decoder errors
///
/// End of stream is not an error: decoders report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// BIF frame with a packet subtype outside {0, 1, 2, 3}
    #[error("unknown BIF packet subtype {subtype} at byte offset {offset}")]
    UnknownPacket {
        /// High nibble of the frame's last byte
        subtype: u8,
        /// Offset of the offending frame
        offset: u64,
    },

    /// Underlying read or seek failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoder Result type alias
pub type Result<T> = std::result::Result<T, DecodeError>;
