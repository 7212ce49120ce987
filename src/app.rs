//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads (or generates) the candidate catalog and observations
//! - runs misfit evaluation, best-fit selection and uncertainty estimation
//! - prints reports/slices
//! - writes optional exports

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DemoArgs, FitArgs, InputArgs, PlotArgs, ReportArgs, SliceArgs, SliceOpts, ViewArgs};
use crate::domain::{FitConfig, Slice};
use crate::error::{AppError, FitError};
use crate::io::RunSummary;
use crate::report::SummaryInput;
use crate::store::CandidateStore;

use pipeline::{RunOutput, SliceSpec};

pub mod pipeline;

/// Model label used in figure names when the catalog does not name one.
const UNKNOWN_GMM: &str = "unknown";

/// Entry point for the `mmifit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; values may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = crate::cli::Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Slice(args) => handle_slice(args),
        Command::View(args) => handle_view(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Log to stderr so stdout stays clean for reports.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.input);
    let inputs = pipeline::load_inputs(&config)?;
    let store = &inputs.catalog.store;
    let run = pipeline::run_fit(store, &inputs.observations, pipeline::weighting_for(&config))?;

    let meta = RunMeta {
        gmm: inputs.catalog.gmm.as_deref(),
        period: inputs.catalog.period,
    };
    report_run(store, inputs.observations.len(), meta, &run, &args.report)?;
    Ok(())
}

fn handle_slice(args: SliceArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.input);
    let inputs = pipeline::load_inputs(&config)?;
    let store = &inputs.catalog.store;
    let run = pipeline::run_fit(store, &inputs.observations, pipeline::weighting_for(&config))?;

    let meta = RunMeta {
        gmm: inputs.catalog.gmm.as_deref(),
        period: inputs.catalog.period,
    };
    if !args.quiet {
        report_run(store, inputs.observations.len(), meta, &run, &args.report)?;
    }

    let slice = pipeline::run_slice(store, &run, &slice_spec_from_args(&args.slice))?;
    print_slice(&slice, &args.plot, meta.gmm.unwrap_or(UNKNOWN_GMM))?;
    Ok(())
}

fn handle_view(args: ViewArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.input);
    let inputs = pipeline::load_inputs(&config)?;
    let run = pipeline::run_fit(
        &inputs.catalog.store,
        &inputs.observations,
        pipeline::weighting_for(&config),
    )?;
    crate::tui::run(&inputs.catalog.store, &run, slice_spec_from_args(&args.slice))
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let synthetic = crate::data::SyntheticConfig {
        seed: args.seed,
        site_count: args.sites,
        noise_sd: args.noise,
        ..Default::default()
    };
    let grid = crate::data::CatalogGrid::around(&synthetic.truth);
    let syn = crate::data::generate(&synthetic, &grid)?;

    if let Some(path) = &args.write_catalog {
        crate::io::write_catalog_json(path, &syn.store, Some(&syn.gmm_name), Some(synthetic.period))?;
    }
    if let Some(path) = &args.write_observations {
        crate::io::write_observations_csv(path, &syn.observations)?;
    }

    let run = pipeline::run_fit(&syn.store, &syn.observations, crate::fit::Weighting::Uniform)?;

    let t = &syn.truth;
    println!(
        "Synthetic truth: M{:.2} at ({:.3}, {:.3}) depth={:.1} strike={:.1} dip={:.1}\n",
        t.magnitude, t.longitude, t.latitude, t.depth, t.strike, t.dip
    );
    let meta = RunMeta {
        gmm: Some(&syn.gmm_name),
        period: Some(synthetic.period),
    };
    report_run(&syn.store, syn.observations.len(), meta, &run, &args.report)?;

    let slice = pipeline::run_slice(&syn.store, &run, &slice_spec_from_args(&args.slice))?;
    print_slice(&slice, &args.plot, &syn.gmm_name)?;
    Ok(())
}

/// Catalog labels carried into reports.
#[derive(Debug, Clone, Copy)]
struct RunMeta<'a> {
    gmm: Option<&'a str>,
    period: Option<f64>,
}

/// Print the summary + ranking and write the optional exports.
fn report_run(
    store: &CandidateStore,
    observation_count: usize,
    meta: RunMeta<'_>,
    run: &RunOutput,
    report: &ReportArgs,
) -> Result<(), FitError> {
    println!(
        "{}",
        crate::report::format_run_summary(&SummaryInput {
            gmm: meta.gmm,
            period: meta.period,
            store,
            observation_count,
            misfit: &run.misfit,
            best: &run.best,
            uncertainty: &run.uncertainty,
        })
    );
    if report.top > 0 {
        println!(
            "{}",
            crate::report::format_top_candidates(store, &run.misfit, &run.uncertainty, report.top)
        );
    }

    if let Some(path) = &report.export {
        crate::io::write_results_csv(path, store, &run.misfit, &run.uncertainty)?;
    }
    if let Some(path) = &report.export_summary {
        let summary = RunSummary {
            tool: "mmifit",
            generated: chrono::Utc::now(),
            gmm: meta.gmm,
            period: meta.period,
            candidates: store.len(),
            observations: observation_count,
            misfit_kind: run.misfit.kind,
            best: &run.best,
            uncertainty: &run.uncertainty,
        };
        crate::io::write_summary_json(path, &summary)?;
    }
    Ok(())
}

/// Export (if asked) and draw one slice.
///
/// The raw points are exported before rendering so that a slice too sparse to
/// draw is still available for inspection.
fn print_slice(slice: &Slice, plot: &PlotArgs, gmm: &str) -> Result<(), FitError> {
    if let Some(path) = &plot.export_slice {
        crate::io::write_slice_csv(path, slice)?;
    }

    let text = match crate::plot::render_ascii_slice(slice, plot.width, plot.height) {
        Ok(text) => text,
        Err(err @ FitError::NotEnoughPoints { .. }) => {
            warn!(
                z = slice.request.z.key(),
                z_value = slice.request.z_value,
                "slice not rendered: {err}"
            );
            return Err(err);
        }
        Err(err) => return Err(err),
    };
    println!("{text}");
    println!(
        "Figure: {}",
        crate::io::slice_figure_name(plot.fig_comment.as_deref(), slice, gmm)
    );
    Ok(())
}

pub fn fit_config_from_args(args: &InputArgs) -> FitConfig {
    FitConfig {
        catalog_path: args.catalog.clone(),
        observations_path: args.observations.clone(),
        weighted: args.weighted,
    }
}

pub fn slice_spec_from_args(args: &SliceOpts) -> SliceSpec {
    SliceSpec {
        x: args.x,
        y: args.y,
        z: args.z,
        z_value: args.z_value,
        dx: args.dx,
        dy: args.dy,
        z_tolerance: args.z_tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Parameter;

    #[test]
    fn slice_args_map_onto_spec() {
        let opts = SliceOpts {
            x: Parameter::Depth,
            y: Parameter::Strike,
            z: Parameter::Dip,
            z_value: Some(45.0),
            dx: 1.0,
            dy: 5.0,
            z_tolerance: Some(0.5),
        };
        let spec = slice_spec_from_args(&opts);
        assert_eq!(spec.x, Parameter::Depth);
        assert_eq!(spec.z_value, Some(45.0));
        assert_eq!(spec.dy, 5.0);
        assert_eq!(spec.z_tolerance, Some(0.5));
    }

    #[test]
    fn input_args_map_onto_config() {
        let args = InputArgs {
            catalog: "cat.json".into(),
            observations: "obs.csv".into(),
            weighted: true,
        };
        let config = fit_config_from_args(&args);
        assert!(config.weighted);
        assert_eq!(config.catalog_path, std::path::PathBuf::from("cat.json"));
        assert_eq!(pipeline::weighting_for(&config), crate::fit::Weighting::Observed);
    }
}
