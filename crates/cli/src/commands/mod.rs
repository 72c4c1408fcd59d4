//! Command implementations.

mod run;
mod scan;
mod validate;

pub use run::run_pipeline;
pub use scan::run_scan;
pub use validate::run_validate;
