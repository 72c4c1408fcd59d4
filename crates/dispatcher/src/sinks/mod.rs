//! Sink implementations
//!
//! Contains CsvSink, JsonLinesSink, LogSink and MemorySink.

mod csv;
mod jsonl;
mod log;
mod memory;

use std::collections::HashMap;
use std::path::PathBuf;

pub use self::csv::CsvSink;
pub use self::jsonl::JsonLinesSink;
pub use self::log::LogSink;
pub use self::memory::MemorySink;

/// Output path from a sink's params map
fn path_param(params: &HashMap<String, String>) -> std::io::Result<PathBuf> {
    params
        .get("path")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })
}
