//! Reporting utilities: run summaries and candidate rankings.

pub mod format;

pub use format::*;
