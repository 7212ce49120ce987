//! Command-line parsing for the MMI rupture fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_SLICE_DX, DEFAULT_SLICE_DY, Parameter};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mmifit", version, about = "Fit earthquake ruptures to felt-intensity (MMI) observations")]
pub struct Cli {
    /// Log filter (e.g. `info`, `mmi_fit=debug`). Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a catalog to observations and print the best fit and acceptance region.
    Fit(FitArgs),
    /// Fit, then render a 2D misfit slice in the terminal.
    Slice(SliceArgs),
    /// Browse misfit slices interactively.
    View(ViewArgs),
    /// Generate a synthetic catalog + observations and run the full pipeline on them.
    Demo(DemoArgs),
}

/// Candidate catalog and observation inputs.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Candidate catalog JSON.
    #[arg(long, value_name = "JSON")]
    pub catalog: PathBuf,

    /// Observations CSV (`mmi` column, optional `weight`, `lon`, `lat`).
    #[arg(long, value_name = "CSV")]
    pub observations: PathBuf,

    /// Use the observation weights (weighted sum of squares instead of RMSE).
    #[arg(long)]
    pub weighted: bool,
}

/// Options shared by everything that prints a fit report.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Show the top-N lowest-misfit candidates.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export per-candidate results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the run summary (best fit + uncertainty model) to JSON.
    #[arg(long = "export-summary")]
    pub export_summary: Option<PathBuf>,
}

/// Which slice to take through the misfit landscape.
#[derive(Debug, Args, Clone)]
pub struct SliceOpts {
    /// Parameter on the horizontal axis.
    #[arg(long, value_enum, default_value_t = Parameter::Longitude)]
    pub x: Parameter,

    /// Parameter on the vertical axis.
    #[arg(long, value_enum, default_value_t = Parameter::Latitude)]
    pub y: Parameter,

    /// Parameter held fixed.
    #[arg(long, value_enum, default_value_t = Parameter::Magnitude)]
    pub z: Parameter,

    /// Value of the fixed parameter (defaults to the best fit's value).
    #[arg(long)]
    pub z_value: Option<f64>,

    /// Grid step along x.
    #[arg(long, default_value_t = DEFAULT_SLICE_DX)]
    pub dx: f64,

    /// Grid step along y.
    #[arg(long, default_value_t = DEFAULT_SLICE_DY)]
    pub dy: f64,

    /// Match z within this absolute tolerance instead of exactly.
    #[arg(long)]
    pub z_tolerance: Option<f64>,
}

/// Terminal plot and slice export options.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,

    /// Export the slice points to CSV.
    #[arg(long = "export-slice")]
    pub export_slice: Option<PathBuf>,

    /// Free-form tag used in the suggested figure name.
    #[arg(long = "fig-comment")]
    pub fig_comment: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SliceArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub slice: SliceOpts,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Skip the fit report and print only the slice.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub slice: SliceOpts,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Random seed for site placement and observation noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of observation sites.
    #[arg(long, default_value_t = 24)]
    pub sites: usize,

    /// Observation noise standard deviation (MMI units).
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Also write the generated catalog to JSON.
    #[arg(long = "write-catalog")]
    pub write_catalog: Option<PathBuf>,

    /// Also write the generated observations to CSV.
    #[arg(long = "write-observations")]
    pub write_observations: Option<PathBuf>,

    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub slice: SliceOpts,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_defaults() {
        let cli = Cli::parse_from([
            "mmifit",
            "slice",
            "--catalog",
            "c.json",
            "--observations",
            "o.csv",
        ]);
        let Command::Slice(args) = cli.command else {
            panic!("expected slice");
        };
        assert_eq!(args.slice.x, Parameter::Longitude);
        assert_eq!(args.slice.y, Parameter::Latitude);
        assert_eq!(args.slice.z, Parameter::Magnitude);
        assert!(args.slice.z_value.is_none());
        assert_eq!(args.slice.dx, 0.02);
        assert_eq!(args.slice.dy, 0.01);
        assert_eq!(args.report.top, 10);
        assert!(!args.input.weighted);
    }

    #[test]
    fn parameter_names_and_global_log_flag() {
        let cli = Cli::parse_from([
            "mmifit", "demo", "--x", "depth", "--y", "dip", "--z", "mag", "--z-value", "6.5",
            "--log-level", "debug",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.slice.x, Parameter::Depth);
        assert_eq!(args.slice.y, Parameter::Dip);
        assert_eq!(args.slice.z_value, Some(6.5));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
