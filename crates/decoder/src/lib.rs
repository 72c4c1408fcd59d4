//! # Decoder
//!
//! Raw stream decoding module.
//!
//! Responsibilities:
//! - Decode BIF 8-byte frames into `TriggerRecord`s
//! - Locate and decode AHCAL `0xCD 0xCD` framed packets
//! - Reconstruct wide cycle counters from narrow rolling hardware fields
//! - Load the supplementary DWC series
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use contracts::BifDecoderConfig;
//! use decoder::{BifDecoder, TriggerSource};
//!
//! let file = BufReader::new(File::open("bif.raw").unwrap());
//! let mut bif = BifDecoder::new(file, BifDecoderConfig::default());
//! while let Some(record) = bif.next_record().unwrap() {
//!     println!("{} @ {}", record.trigger_count, record.fine_timestamp);
//! }
//! ```
//!
//! ## Mock Streams
//!
//! ```
//! use decoder::mock::AhcalStreamBuilder;
//! use decoder::{AhcalDecoder, TriggerSource};
//!
//! let stream = AhcalStreamBuilder::new()
//!     .start_acquisition(5, 0)
//!     .trigger(7, 1, 100)
//!     .into_cursor();
//! let mut ahcal = AhcalDecoder::new(stream, Default::default());
//! assert_eq!(ahcal.next_record().unwrap().unwrap().cycle, 7);
//! ```

mod ahcal;
mod bif;
mod counter;
mod error;
pub mod field;
pub mod mock;
mod series;
mod source;
mod stats;

// Re-exports
pub use ahcal::AhcalDecoder;
pub use bif::BifDecoder;
pub use contracts::{Baseline, StreamKind, TriggerRecord};
pub use counter::update_counter_modulo;
pub use error::{DecodeError, Result};
pub use series::CsvSeries;
pub use source::TriggerSource;
pub use stats::DecoderStats;
