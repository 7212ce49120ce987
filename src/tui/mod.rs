//! Ratatui-based slice browser.
//!
//! Shows the misfit heatmap for one value of the fixed parameter and lets the
//! user step through the other values present in the catalog.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{RunOutput, SliceSpec};
use crate::domain::Slice;
use crate::error::{AppError, FitError};
use crate::plot::SliceChart;
use crate::slice::build_slice;
use crate::store::CandidateStore;

/// Exit code for terminal setup/draw failures.
const TERMINAL_EXIT_CODE: u8 = 5;

/// Start the slice browser.
pub fn run(store: &CandidateStore, run: &RunOutput, spec: SliceSpec) -> Result<(), AppError> {
    let mut app = App::new(store, run, spec)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| {
        AppError::new(TERMINAL_EXIT_CODE, format!("Failed to initialize terminal: {e}"))
    })?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| {
            AppError::new(TERMINAL_EXIT_CODE, format!("Failed to enable raw mode: {e}"))
        })?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                TERMINAL_EXIT_CODE,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<'a> {
    store: &'a CandidateStore,
    run: &'a RunOutput,
    spec: SliceSpec,
    /// Distinct values of the fixed parameter, ascending.
    z_values: Vec<f64>,
    z_index: usize,
    /// Index of the best fit's z value; `b` jumps back here.
    best_index: usize,
    slice: Result<Slice, FitError>,
}

impl<'a> App<'a> {
    fn new(store: &'a CandidateStore, run: &'a RunOutput, spec: SliceSpec) -> Result<Self, FitError> {
        let z_values = distinct_values(store.parameter_values(spec.z));
        if z_values.is_empty() {
            return Err(FitError::EmptyInput("no candidates to slice".to_string()));
        }
        let best_index = nearest_index(&z_values, run.best.params.get(spec.z));
        let z_index = spec
            .z_value
            .map_or(best_index, |v| nearest_index(&z_values, v));

        let mut app = Self {
            store,
            run,
            spec,
            z_values,
            z_index,
            best_index,
            slice: Err(FitError::NotEnoughPoints { found: 0 }),
        };
        app.rebuild();
        Ok(app)
    }

    fn rebuild(&mut self) {
        let mut spec = self.spec;
        spec.z_value = Some(self.z_values[self.z_index]);
        let request = spec.resolve(&self.run.best);
        self.slice = build_slice(self.store, &self.run.misfit, &request, Some(&self.run.uncertainty));
    }

    fn step(&mut self, delta: isize) {
        let last = self.z_values.len() - 1;
        let next = self.z_index.saturating_add_signed(delta).min(last);
        if next != self.z_index {
            self.z_index = next;
            self.rebuild();
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f)).map_err(|e| {
                    AppError::new(TERMINAL_EXIT_CODE, format!("Terminal draw error: {e}"))
                })?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| {
                AppError::new(TERMINAL_EXIT_CODE, format!("Event poll error: {e}"))
            })? {
                continue;
            }

            match event::read()
                .map_err(|e| AppError::new(TERMINAL_EXIT_CODE, format!("Event read error: {e}")))?
            {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left | KeyCode::Char('h') => self.step(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step(1),
            KeyCode::Home => self.step(isize::MIN),
            KeyCode::End => self.step(isize::MAX),
            KeyCode::Char('b') => {
                if self.z_index != self.best_index {
                    self.z_index = self.best_index;
                    self.rebuild();
                }
            }
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let best = &self.run.best;
        let u = &self.run.uncertainty;
        let z = self.spec.z;

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("mmifit", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " - {} vs {} at {}={:.3} ({}/{})",
                self.spec.x.key(),
                self.spec.y.key(),
                z.key(),
                self.z_values[self.z_index],
                self.z_index + 1,
                self.z_values.len(),
            )),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "best: {} misfit={:.4} | M{:.2} ({:.3}, {:.3}) depth={:.1}",
                best.id,
                best.misfit,
                best.params.magnitude,
                best.params.longitude,
                best.params.latitude,
                best.params.depth,
            ),
            Style::default().fg(Color::Gray),
        )));
        let acceptance = match u.contour_levels() {
            Some(levels) => format!(
                "sigma={:.4} threshold={:.4} | accepted {} of {}",
                levels.sigma,
                levels.threshold,
                u.accepted.len(),
                self.store.len()
            ),
            None => format!(
                "insufficient data (n={}): no acceptance contours",
                u.observation_count
            ),
        };
        lines.push(Line::from(Span::styled(acceptance, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Misfit slice").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chart = self.slice.as_ref().map_err(Clone::clone).and_then(SliceChart::new);
        match chart {
            Ok(chart) => frame.render_widget(chart, inner),
            Err(err) => {
                let msg = Paragraph::new(err.to_string())
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center);
                frame.render_widget(msg, inner);
            }
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ step z  Home/End first/last  b best  q quit";
        let status = match &self.slice {
            Ok(slice) => format!("{} points", slice.points.len()),
            Err(_) => "no slice".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Sorted distinct finite values.
fn distinct_values(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| v.is_finite());
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Index of the value closest to `target` (first on ties). `values` must be non-empty.
fn nearest_index(values: &[f64], target: f64) -> usize {
    let distances: Vec<f64> = values.iter().map(|v| (v - target).abs()).collect();
    crate::fit::argmin(&distances).map_or(0, |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CatalogGrid, SyntheticConfig, generate};
    use crate::domain::Parameter;
    use crate::fit::Weighting;
    use ratatui::backend::TestBackend;

    fn spec() -> SliceSpec {
        SliceSpec {
            x: Parameter::Longitude,
            y: Parameter::Latitude,
            z: Parameter::Magnitude,
            z_value: None,
            dx: 0.1,
            dy: 0.1,
            z_tolerance: None,
        }
    }

    #[test]
    fn distinct_values_sorted_and_deduped() {
        assert_eq!(distinct_values(vec![7.0, 6.5, 7.0, f64::NAN, 6.0]), vec![6.0, 6.5, 7.0]);
    }

    #[test]
    fn nearest_index_prefers_first_on_tie() {
        let v = [6.0, 6.5, 7.0];
        assert_eq!(nearest_index(&v, 6.9), 2);
        assert_eq!(nearest_index(&v, 6.25), 0);
    }

    #[test]
    fn stepping_stays_in_bounds_and_rebuilds() {
        let config = SyntheticConfig::default();
        let syn = generate(&config, &CatalogGrid::around(&config.truth)).unwrap();
        let run = crate::app::pipeline::run_fit(&syn.store, &syn.observations, Weighting::Uniform).unwrap();

        let mut app = App::new(&syn.store, &run, spec()).unwrap();
        assert_eq!(app.z_values.len(), 5);
        assert!(app.slice.is_ok());

        app.handle_key(KeyCode::End);
        assert_eq!(app.z_index, 4);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.z_index, 4);
        let z = app.slice.as_ref().unwrap().request.z_value;
        assert_eq!(z, app.z_values[4]);

        app.handle_key(KeyCode::Home);
        assert_eq!(app.z_index, 0);
        app.handle_key(KeyCode::Char('b'));
        assert_eq!(app.z_index, app.best_index);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn draws_into_test_backend() {
        let config = SyntheticConfig::default();
        let syn = generate(&config, &CatalogGrid::around(&config.truth)).unwrap();
        let run = crate::app::pipeline::run_fit(&syn.store, &syn.observations, Weighting::Uniform).unwrap();
        let app = App::new(&syn.store, &run, spec()).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Misfit slice"));
        assert!(text.contains("longitude vs latitude"));
    }
}
