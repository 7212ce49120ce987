//! Regular grid generation and nearest-neighbour interpolation.
//!
//! Slices are scattered `(x, y, misfit)` points. For contouring we resample them
//! onto a regular grid without smoothing: each grid node takes the misfit of the
//! closest scattered point (Euclidean distance in raw parameter units).

use rayon::prelude::*;

use crate::domain::{SliceGrid, SlicePoint};
use crate::error::FitError;

/// Upper bound on grid nodes for a single slice.
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// Relative slack so a range that is an exact multiple of `step` keeps its endpoint.
const STEP_EPS: f64 = 1e-9;

fn check_step(step: f64) -> Result<(), FitError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(FitError::configuration(format!(
            "grid step must be finite and > 0 (got {step})"
        )));
    }
    Ok(())
}

/// Node count `min, min+step, ...` not exceeding `max`, as a float so huge counts don't wrap.
fn node_count(min: f64, max: f64, step: f64) -> f64 {
    ((max - min) / step + STEP_EPS).floor() + 1.0
}

fn axis_len(min: f64, max: f64, step: f64) -> Result<usize, FitError> {
    check_step(step)?;
    if !(min.is_finite() && max.is_finite()) || max < min {
        return Err(FitError::configuration(format!(
            "invalid grid range [{min}, {max}]"
        )));
    }
    let n = node_count(min, max, step);
    if n > MAX_GRID_CELLS as f64 {
        return Err(FitError::configuration(format!(
            "grid step {step} over [{min}, {max}] gives too many nodes"
        )));
    }
    Ok(n as usize)
}

/// Evenly spaced axis from `min` to `max` (inclusive when `max - min` is a multiple of `step`).
pub fn regular_axis(min: f64, max: f64, step: f64) -> Result<Vec<f64>, FitError> {
    let n = axis_len(min, max, step)?;
    Ok((0..n).map(|i| min + step * i as f64).collect())
}

/// Steps no finer than `(dx, dy)` whose grid over the points' extent fits in
/// `MAX_GRID_CELLS`. Both steps are scaled by the same factor, so the aspect
/// of the requested resolution is kept.
pub fn fit_steps(points: &[SlicePoint], dx: f64, dy: f64) -> Result<(f64, f64), FitError> {
    check_step(dx)?;
    check_step(dy)?;
    let Some((x_min, x_max, y_min, y_max)) = extent(points) else {
        return Ok((dx, dy));
    };

    let cap = MAX_GRID_CELLS as f64;
    let mut scale = 1.0;
    loop {
        let cells = node_count(x_min, x_max, dx * scale) * node_count(y_min, y_max, dy * scale);
        if cells <= cap {
            return Ok((dx * scale, dy * scale));
        }
        // sqrt(ratio) lands close for 2D grids; the floor keeps progress when one axis is flat.
        scale *= (cells / cap).sqrt().max(1.01);
    }
}

/// Resample scattered points onto a regular grid spanning their extent.
///
/// Returns an empty grid for an empty point set. Steps must already respect
/// `MAX_GRID_CELLS` (see `fit_steps`).
pub fn interpolate_nearest(points: &[SlicePoint], dx: f64, dy: f64) -> Result<SliceGrid, FitError> {
    let Some((x_min, x_max, y_min, y_max)) = extent(points) else {
        // Still validate the resolution so bad settings never pass silently.
        check_step(dx)?;
        check_step(dy)?;
        return Ok(SliceGrid::default());
    };

    let nx = axis_len(x_min, x_max, dx)?;
    let ny = axis_len(y_min, y_max, dy)?;
    if nx.saturating_mul(ny) > MAX_GRID_CELLS {
        return Err(FitError::configuration(format!(
            "slice grid of {nx}x{ny} nodes exceeds the limit of {MAX_GRID_CELLS}"
        )));
    }

    let xs = regular_axis(x_min, x_max, dx)?;
    let ys = regular_axis(y_min, y_max, dy)?;
    let values = xs
        .par_iter()
        .map(|&gx| ys.iter().map(|&gy| nearest(points, gx, gy)).collect())
        .collect();

    Ok(SliceGrid { xs, ys, values })
}

fn extent(points: &[SlicePoint]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let mut out = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        out.0 = out.0.min(p.x);
        out.1 = out.1.max(p.x);
        out.2 = out.2.min(p.y);
        out.3 = out.3.max(p.y);
    }
    Some(out)
}

fn nearest(points: &[SlicePoint], x: f64, y: f64) -> f64 {
    let mut best_d2 = f64::INFINITY;
    let mut value = f64::NAN;
    for p in points {
        let dx = p.x - x;
        let dy = p.y - y;
        let d2 = dx * dx + dy * dy;
        if d2 < best_d2 {
            best_d2 = d2;
            value = p.misfit;
        }
    }
    value
}
