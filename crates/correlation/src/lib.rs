//! # Correlation
//!
//! Pairs BIF and AHCAL trigger records into a merged event stream.
//!
//! Responsibilities:
//! - Establish the constant time offset between both streams
//! - Classify each pair as matched, BIF-only or AHCAL-only
//! - Track the match rate over a bounded window of rows
//! - Resynchronize by rewinding and re-seeding with shifted starting records
//!
//! ## Usage Example
//!
//! ```ignore
//! use correlation::CorrelationEngine;
//!
//! let mut engine = CorrelationEngine::from_streams(
//!     bif_file,
//!     ahcal_file,
//!     None,
//!     &blueprint.decoder,
//!     blueprint.correlation.clone(),
//! );
//! let summary = engine.run(&mut sink)?;
//! println!("{summary}");
//! ```

mod engine;
mod error;
mod summary;
mod window;

// Re-exports
pub use contracts::{CorrelationConfig, MergedRow, RowKind, WindowMode};
pub use engine::{CorrelationEngine, EngineState, StepEvent};
pub use error::{CorrelationError, Result};
pub use summary::CorrelationSummary;
pub use window::MatchWindow;
