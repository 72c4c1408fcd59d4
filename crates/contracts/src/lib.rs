//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the correlator:
//! decoded trigger records, merged output rows, the sink and supplementary
//! series traits, configuration types and the shared error type.
//! Business crates depend on this crate only, never the other way round.
//!
//! ## Time Model
//! - BIF fine timestamps carry 5 sub-tick correction bits below the 48-bit
//!   hardware tick (`fine_timestamp >> 5` is the coarse tick)
//! - AHCAL timestamps are plain 48-bit ticks
//! - Neither stream shares a clock with the other; the correlation engine
//!   derives the offset between them

mod blueprint;
mod config;
mod error;
mod record;
mod row;
mod series;
mod sink;

pub use blueprint::*;
pub use config::*;
pub use error::*;
pub use record::*;
pub use row::*;
pub use series::{SeriesEntry, TimeSeries, VecSeries};
pub use sink::RowSink;
