//! Slice rendering.
//!
//! Both renderers refuse slices with fewer than two points
//! (`FitError::NotEnoughPoints`) and draw the filled surface without contours
//! when no bounded uncertainty model was supplied.

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_slice;
pub use chart::SliceChart;
