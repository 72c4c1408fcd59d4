//! Correlation error types

use contracts::{ContractError, StreamKind};
use decoder::DecodeError;
use thiserror::Error;

/// Correlation engine errors
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// Decoder failure (unknown packet, read error)
    #[error("{stream} decode error: {source}")]
    Decode {
        stream: StreamKind,
        #[source]
        source: DecodeError,
    },

    /// A stream yields no trigger at all
    #[error("{stream} stream contains no trigger records")]
    EmptyStream { stream: StreamKind },

    /// Resynchronization cap reached without a stable alignment
    #[error("streams could not be aligned after {attempts} resynchronizations")]
    Irreconcilable { attempts: u32 },

    /// Sink failure
    #[error("sink error: {0}")]
    Sink(#[from] ContractError),
}

impl CorrelationError {
    pub(crate) fn decode(stream: StreamKind) -> impl FnOnce(DecodeError) -> Self {
        move |source| Self::Decode { stream, source }
    }
}

/// Correlation Result type alias
pub type Result<T> = std::result::Result<T, CorrelationError>;
