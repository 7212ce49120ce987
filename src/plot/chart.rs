//! Plotters-powered slice heatmap widget for Ratatui.
//!
//! Why Plotters instead of hand-drawing cells?
//! - nicer axis + tick label rendering
//! - the same drawing code can later target a bitmap/SVG backend
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
// `ratatui::style::Color` below shadows the prelude's trait of the same name.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::Slice;
use crate::error::FitError;

/// Colour stops from lowest misfit (dark purple) to highest (yellow).
const STOPS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// A render-only heatmap of one slice with optional contour overlay.
///
/// Construction checks that the slice has enough points, so `render()` never
/// has to decide whether drawing makes sense.
pub struct SliceChart<'a> {
    slice: &'a Slice,
}

impl<'a> SliceChart<'a> {
    pub fn new(slice: &'a Slice) -> Result<Self, FitError> {
        slice.ensure_renderable()?;
        Ok(Self { slice })
    }
}

/// Map a misfit onto the colour ramp.
pub fn misfit_color(v: f64, v_min: f64, v_max: f64) -> RGBColor {
    let span = v_max - v_min;
    let u = if span > 0.0 && v.is_finite() {
        ((v - v_min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let pos = u * (STOPS.len() - 1) as f64;
    let i = (pos.floor() as usize).min(STOPS.len() - 2);
    let t = pos - i as f64;
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    let (r0, g0, b0) = STOPS[i];
    let (r1, g1, b1) = STOPS[i + 1];
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Grid nodes just inside `level` that neighbour a node at or above it.
fn boundary_nodes(values: &[Vec<f64>], level: f64) -> Vec<(usize, usize)> {
    let nx = values.len();
    let ny = values.first().map_or(0, Vec::len);
    let mut out = Vec::new();
    for i in 0..nx {
        for j in 0..ny {
            if !(values[i][j] < level) {
                continue;
            }
            let outside = |a: usize, b: usize| values[a][b] >= level;
            if (i > 0 && outside(i - 1, j))
                || (i + 1 < nx && outside(i + 1, j))
                || (j > 0 && outside(i, j - 1))
                || (j + 1 < ny && outside(i, j + 1))
            {
                out.push((i, j));
            }
        }
    }
    out
}

impl Widget for SliceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let slice = self.slice;
        let grid = &slice.grid;
        let (Some(&gx0), Some(&gx1), Some(&gy0), Some(&gy1)) =
            (grid.xs.first(), grid.xs.last(), grid.ys.first(), grid.ys.last())
        else {
            return;
        };
        let hx = slice.request.dx / 2.0;
        let hy = slice.request.dy / 2.0;
        let (x0, x1, y0, y1) = (gx0 - hx, gx1 + hx, gy0 - hy, gy1 + hy);
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let (v_min, v_max) = slice.misfit_range.unwrap_or((0.0, 1.0));
        let x_label = slice.request.x.display_name();
        let y_label = slice.request.y.display_name();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(x_label)
                .y_desc(y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.2}"))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // 1) Filled surface.
            chart.draw_series(grid.xs.iter().enumerate().flat_map(|(i, &x)| {
                grid.ys.iter().enumerate().map(move |(j, &y)| {
                    let color = misfit_color(grid.values[i][j], v_min, v_max);
                    Rectangle::new([(x - hx, y - hy), (x + hx, y + hy)], color.filled())
                })
            }))?;

            // 2) Accepted-region boundaries, when an uncertainty model exists.
            if let Some(levels) = slice.contour_levels {
                for (level, color) in [(levels.sigma, BLACK), (levels.threshold, WHITE)] {
                    chart.draw_series(
                        boundary_nodes(&grid.values, level)
                            .into_iter()
                            .map(|(i, j)| Pixel::new((grid.xs[i], grid.ys[j]), color)),
                    )?;
                }
            }

            // 3) Best slice point.
            //
            // `Circle` radii are mapped incorrectly by the ratatui backend, so a
            // coloured `Pixel` is used as the marker.
            if let Some(best) = slice.best_point() {
                chart.draw_series(std::iter::once(Pixel::new((best.x, best.y), RED)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
