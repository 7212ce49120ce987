//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - rupture parameters and candidates (`Parameter`, `RuptureParams`, `Candidate`)
//! - fit outputs (`MisfitResult`, `BestFit`, `UncertaintyModel`)
//! - slice requests and outputs (`SliceRequest`, `Slice`)

pub mod types;

pub use types::*;
