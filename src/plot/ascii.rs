//! ASCII heatmap of a misfit slice for terminal output.
//!
//! This is intentionally "dumb" (fixed-size character grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - filled surface: density ramp, `@` = lowest misfit, blank = highest
//! - `o`: boundary of the `sigma` level
//! - `#`: boundary of the acceptance threshold
//! - `X`: slice point with the lowest misfit

use crate::domain::{ContourLevels, Slice};
use crate::error::FitError;

/// Shading from highest misfit (index 0) to lowest.
const RAMP: [char; 9] = [' ', '.', ':', '-', '=', '+', '*', '%', '@'];

/// Render a slice as text. Fails with `NotEnoughPoints` instead of drawing a
/// meaningless surface.
pub fn render_ascii_slice(slice: &Slice, width: usize, height: usize) -> Result<String, FitError> {
    slice.ensure_renderable()?;

    let width = width.max(4);
    let height = height.max(2);
    let grid = &slice.grid;
    let (x_min, x_max) = axis_range(&grid.xs);
    let (y_min, y_max) = axis_range(&grid.ys);
    let (v_min, v_max) = slice
        .misfit_range
        .or_else(|| value_range(&grid.values))
        .unwrap_or((0.0, 1.0));

    // Sample the grid once per character cell (row 0 is the top = max y).
    let cells: Vec<Vec<f64>> = (0..height)
        .map(|row| {
            let gy = cell_to_index(height - 1 - row, height, grid.ys.len());
            (0..width)
                .map(|col| {
                    let gx = cell_to_index(col, width, grid.xs.len());
                    grid.values[gx][gy]
                })
                .collect()
        })
        .collect();

    let mut canvas: Vec<Vec<char>> = cells
        .iter()
        .map(|row| row.iter().map(|&v| shade(v, v_min, v_max)).collect())
        .collect();

    if let Some(levels) = slice.contour_levels {
        draw_boundary(&mut canvas, &cells, levels.sigma, 'o');
        draw_boundary(&mut canvas, &cells, levels.threshold, '#');
    }

    if let Some(best) = slice.best_point() {
        let col = map_to_cell(best.x, x_min, x_max, width);
        let row = height - 1 - map_to_cell(best.y, y_min, y_max, height);
        canvas[row][col] = 'X';
    }

    let r = &slice.request;
    let mut out = String::new();
    out.push_str(&format!(
        "Slice: {}={:.2} | {}=[{x_min:.3}, {x_max:.3}] | {}=[{y_min:.3}, {y_max:.3}] | misfit=[{v_min:.3}, {v_max:.3}]\n",
        r.z.key(),
        r.z_value,
        r.x.key(),
        r.y.key(),
    ));
    for row in canvas {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    if let Some(ContourLevels { sigma, threshold }) = slice.contour_levels {
        out.push_str(&format!("o: sigma={sigma:.3}  #: threshold={threshold:.3}  X: best\n"));
    }

    Ok(out)
}

fn axis_range(values: &[f64]) -> (f64, f64) {
    let first = values.first().copied().unwrap_or(0.0);
    let last = values.last().copied().unwrap_or(first);
    (first, last)
}

fn value_range(values: &[Vec<f64>]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values.iter().flatten().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Map character cell `i` of `cells` onto one of `n` grid nodes.
fn cell_to_index(i: usize, cells: usize, n: usize) -> usize {
    if n <= 1 || cells <= 1 {
        return 0;
    }
    let u = i as f64 / (cells as f64 - 1.0);
    ((u * (n as f64 - 1.0)).round() as usize).min(n - 1)
}

fn map_to_cell(v: f64, min: f64, max: f64, cells: usize) -> usize {
    if !(max > min) {
        return 0;
    }
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    (u * (cells as f64 - 1.0)).round() as usize
}

fn shade(v: f64, v_min: f64, v_max: f64) -> char {
    if !v.is_finite() {
        return ' ';
    }
    let span = v_max - v_min;
    let u = if span > 0.0 {
        ((v - v_min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let idx = ((1.0 - u) * (RAMP.len() as f64 - 1.0)).round() as usize;
    RAMP[idx.min(RAMP.len() - 1)]
}

/// Mark cells inside `level` that touch a cell at or above it.
fn draw_boundary(canvas: &mut [Vec<char>], cells: &[Vec<f64>], level: f64, ch: char) {
    let height = cells.len();
    let width = cells.first().map_or(0, Vec::len);
    for row in 0..height {
        for col in 0..width {
            if !(cells[row][col] < level) {
                continue;
            }
            let outside = |r: usize, c: usize| cells[r][c] >= level;
            let touches = (row > 0 && outside(row - 1, col))
                || (row + 1 < height && outside(row + 1, col))
                || (col > 0 && outside(row, col - 1))
                || (col + 1 < width && outside(row, col + 1));
            if touches {
                canvas[row][col] = ch;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Parameter, SliceGrid, SlicePoint, SliceRequest};

    fn two_point_slice(levels: Option<ContourLevels>) -> Slice {
        let mut request = SliceRequest::new(Parameter::Longitude, Parameter::Latitude, Parameter::Magnitude, 7.0);
        request.dx = 1.0;
        request.dy = 1.0;
        Slice {
            request,
            points: vec![
                SlicePoint { x: 0.0, y: 0.0, misfit: 0.0 },
                SlicePoint { x: 1.0, y: 0.0, misfit: 1.0 },
            ],
            grid: SliceGrid {
                xs: vec![0.0, 1.0],
                ys: vec![0.0],
                values: vec![vec![0.0], vec![1.0]],
            },
            contour_levels: levels,
            misfit_range: Some((0.0, 1.0)),
        }
    }

    #[test]
    fn golden_snapshot_small() {
        let txt = render_ascii_slice(&two_point_slice(None), 4, 2).unwrap();
        let expected = concat!(
            "Slice: mag=7.00 | longitude=[0.000, 1.000] | latitude=[0.000, 0.000] | misfit=[0.000, 1.000]\n",
            "@@  \n",
            "X@  \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn contour_levels_draw_boundaries_and_legend() {
        let levels = ContourLevels {
            sigma: 0.4,
            threshold: 0.8,
        };
        let txt = render_ascii_slice(&two_point_slice(Some(levels)), 4, 2).unwrap();
        assert!(txt.contains('#'));
        assert!(txt.contains("threshold=0.800"));
    }

    #[test]
    fn single_point_is_not_rendered() {
        let mut slice = two_point_slice(None);
        slice.points.truncate(1);
        let err = render_ascii_slice(&slice, 10, 5).unwrap_err();
        assert_eq!(err, FitError::NotEnoughPoints { found: 1 });
    }
}
