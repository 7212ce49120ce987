//! `mmi-fit` library crate.
//!
//! The binary (`mmifit`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes
//! - the rupture/ground-motion layer can plug in through `source` traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod plot;
pub mod report;
pub mod slice;
pub mod source;
pub mod store;
pub mod tui;
