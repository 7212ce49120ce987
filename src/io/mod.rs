//! Input/output helpers.
//!
//! - candidate catalog JSON read/write (`catalog`)
//! - observation CSV ingest (`observations`)
//! - result exports (CSV/JSON) and figure naming (`export`)

pub mod catalog;
pub mod export;
pub mod observations;

pub use catalog::*;
pub use export::*;
pub use observations::*;
