//! RowSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks of merged rows.

use crate::{ContractError, MergedRow};

/// Merged row output trait
///
/// All sink implementations must implement this trait. Rows arrive in
/// emission order; `discard` drops everything written since the last
/// discard (the engine calls it when it resynchronizes and replays).
pub trait RowSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one merged row
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError>;

    /// Drop all rows written so far
    fn discard(&mut self) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    fn close(&mut self) -> Result<(), ContractError>;
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        (**self).write(row)
    }

    fn discard(&mut self) -> Result<(), ContractError> {
        (**self).discard()
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        (**self).write(row)
    }

    fn discard(&mut self) -> Result<(), ContractError> {
        (**self).discard()
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
