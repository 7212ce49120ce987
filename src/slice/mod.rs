//! 2D slices of the misfit landscape.
//!
//! A slice fixes one parameter (`z`) at a value and looks at the misfit over two
//! others (`x`, `y`):
//!
//! 1. keep candidates whose `z` matches the requested value
//! 2. collapse everything else: one point per unique `(x, y)` carrying the
//!    minimum misfit among its candidates
//! 3. resample onto a regular grid (nearest neighbour), coarsening the
//!    requested steps when the grid would exceed `MAX_GRID_CELLS`
//! 4. attach `(sigma, threshold)` contour levels when a bounded uncertainty
//!    model is available
//!
//! Data retrieval never fails for lack of points. Whether there is enough to
//! draw is a separate question answered by `Slice::ensure_renderable`.

pub mod grid;

pub use grid::*;

use tracing::{debug, warn};

use crate::domain::{MisfitResult, Slice, SlicePoint, SliceRequest, UncertaintyModel};
use crate::error::FitError;
use crate::store::CandidateStore;

/// Extract a slice from the candidate store and its misfit.
pub fn build_slice(
    store: &CandidateStore,
    misfit: &MisfitResult,
    request: &SliceRequest,
    uncertainty: Option<&UncertaintyModel>,
) -> Result<Slice, FitError> {
    if misfit.len() != store.len() {
        return Err(FitError::configuration(format!(
            "misfit result has {} values for {} candidates",
            misfit.len(),
            store.len()
        )));
    }
    if request.x == request.y || request.z == request.x || request.z == request.y {
        return Err(FitError::configuration(format!(
            "slice parameters must be distinct (x={}, y={}, z={})",
            request.x.key(),
            request.y.key(),
            request.z.key()
        )));
    }

    let points = collapse_points(store, misfit, request);
    let mut request = request.clone();
    let (dx, dy) = fit_steps(&points, request.dx, request.dy)?;
    if (dx, dy) != (request.dx, request.dy) {
        warn!(
            requested_dx = request.dx,
            requested_dy = request.dy,
            dx,
            dy,
            "slice resolution coarsened to stay within {MAX_GRID_CELLS} grid nodes"
        );
        request.dx = dx;
        request.dy = dy;
    }
    let grid = interpolate_nearest(&points, dx, dy)?;

    debug!(
        z = request.z.key(),
        z_value = request.z_value,
        points = points.len(),
        nx = grid.xs.len(),
        ny = grid.ys.len(),
        "built slice"
    );

    Ok(Slice {
        request,
        points,
        grid,
        contour_levels: uncertainty.and_then(UncertaintyModel::contour_levels),
        misfit_range: misfit.range(),
    })
}

/// Minimum misfit per unique `(x, y)` among candidates matching `z`, ordered by x then y.
fn collapse_points(
    store: &CandidateStore,
    misfit: &MisfitResult,
    request: &SliceRequest,
) -> Vec<SlicePoint> {
    let mut matched: Vec<SlicePoint> = store
        .iter()
        .zip(&misfit.values)
        .filter(|(c, _)| request.z_match.matches(c.params.get(request.z), request.z_value))
        .map(|(c, &m)| SlicePoint {
            x: c.params.get(request.x),
            y: c.params.get(request.y),
            misfit: m,
        })
        .collect();

    matched.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut out: Vec<SlicePoint> = Vec::with_capacity(matched.len());
    for p in matched {
        match out.last_mut() {
            Some(last) if last.x == p.x && last.y == p.y => {
                last.misfit = last.misfit.min(p.misfit);
            }
            _ => out.push(p),
        }
    }
    out
}

impl Slice {
    /// Rendering needs at least two distinct `(x, y)` points.
    pub fn ensure_renderable(&self) -> Result<(), FitError> {
        if self.points.len() < 2 {
            return Err(FitError::NotEnoughPoints {
                found: self.points.len(),
            });
        }
        Ok(())
    }

    /// Slice point with the lowest misfit (first on ties).
    pub fn best_point(&self) -> Option<&SlicePoint> {
        let values: Vec<f64> = self.points.iter().map(|p| p.misfit).collect();
        crate::fit::argmin(&values).and_then(|(idx, _)| self.points.get(idx))
    }
}
