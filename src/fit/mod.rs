//! Fitting engine.
//!
//! Responsibilities:
//!
//! - evaluate misfit for every candidate (parallel, order-preserving)
//! - select the best fit (deterministic tie-breaks)
//! - derive the acceptance region and parameter ranges

pub mod best;
pub mod misfit;
pub mod uncertainty;

pub use best::*;
pub use misfit::*;
pub use uncertainty::*;
