//! # Dispatcher
//!
//! Merged row output module.
//!
//! Responsibilities:
//! - Build sinks from `SinkConfig`
//! - Fan-out every merged row to all sinks
//! - Forward resync discards so file outputs only hold the final pass

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{MergedRow, RowSink};
pub use dispatcher::{create_sink, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{CsvSink, JsonLinesSink, LogSink, MemorySink};
