//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - handed to any rendering layer as plain data

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of free rupture parameters used for degrees of freedom.
pub const FREE_PARAMETER_COUNT: usize = 6;

/// One of the six rupture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Moment magnitude.
    #[serde(rename = "mag")]
    #[value(name = "mag")]
    Magnitude,
    /// Hypocenter longitude (degrees).
    Longitude,
    /// Hypocenter latitude (degrees).
    Latitude,
    /// Hypocenter depth (km).
    Depth,
    /// Rupture surface strike (degrees).
    Strike,
    /// Rupture surface dip (degrees).
    Dip,
}

impl Parameter {
    pub const ALL: [Parameter; FREE_PARAMETER_COUNT] = [
        Parameter::Magnitude,
        Parameter::Longitude,
        Parameter::Latitude,
        Parameter::Depth,
        Parameter::Strike,
        Parameter::Dip,
    ];

    /// Short key used in file names and exports.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Magnitude => "mag",
            Parameter::Longitude => "longitude",
            Parameter::Latitude => "latitude",
            Parameter::Depth => "depth",
            Parameter::Strike => "strike",
            Parameter::Dip => "dip",
        }
    }

    /// Human-readable label for terminal output and chart axes.
    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::Magnitude => "Magnitude",
            Parameter::Longitude => "Longitude (deg)",
            Parameter::Latitude => "Latitude (deg)",
            Parameter::Depth => "Depth (km)",
            Parameter::Strike => "Strike (deg)",
            Parameter::Dip => "Dip (deg)",
        }
    }
}

/// Rupture parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuptureParams {
    #[serde(rename = "mag")]
    pub magnitude: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub depth: f64,
    pub strike: f64,
    pub dip: f64,
}

impl RuptureParams {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Magnitude => self.magnitude,
            Parameter::Longitude => self.longitude,
            Parameter::Latitude => self.latitude,
            Parameter::Depth => self.depth,
            Parameter::Strike => self.strike,
            Parameter::Dip => self.dip,
        }
    }
}

/// One evaluated rupture: its parameters and predicted intensity per site.
///
/// The intensity field is index-aligned with the observation vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub params: RuptureParams,
    pub intensity: Vec<f64>,
}

/// An observation site (metadata only; the engine never reads coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub longitude: f64,
    pub latitude: f64,
}

/// Which misfit statistic a `MisfitResult` holds.
///
/// The two forms do not share units; both are "smaller is better".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisfitKind {
    /// `sqrt(Σ (pred − obs)² / N)`.
    Rmse,
    /// `Σ ŵᵢ (predᵢ − obsᵢ)²` with `Σ ŵᵢ = 1` (not square-rooted).
    WeightedSumSquares,
}

impl MisfitKind {
    pub fn label(self) -> &'static str {
        match self {
            MisfitKind::Rmse => "RMSE",
            MisfitKind::WeightedSumSquares => "weighted SS",
        }
    }
}

/// Per-candidate misfit, index-aligned with the candidate store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisfitResult {
    pub kind: MisfitKind,
    pub values: Vec<f64>,
}

impl MisfitResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finite (min, max) over all values, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in self.values.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo.is_finite() && hi.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }
}

/// The candidate achieving the minimum misfit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestFit {
    pub index: usize,
    pub id: String,
    pub params: RuptureParams,
    pub misfit: f64,
}

/// Whether the acceptance threshold came from the normal model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyStatus {
    /// `N > 6`: threshold is the 97.5th percentile of `Normal(min, sigma)`.
    Bounded,
    /// `N <= 6`: under-determined; threshold is an effectively unbounded sentinel.
    InsufficientData,
}

/// (min, max) of one parameter over the accepted candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Acceptance region derived from a misfit result and its best fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyModel {
    pub observation_count: usize,
    /// `N − 6`; zero or negative when under-determined.
    pub degrees_of_freedom: i64,
    pub status: UncertaintyStatus,
    pub min_misfit: f64,
    /// Standard deviation of the normal model (`None` in the fallback state).
    pub sigma: Option<f64>,
    pub threshold: f64,
    /// Accepted candidate indices, ascending.
    pub accepted: Vec<usize>,
    /// One range per parameter, in `Parameter::ALL` order.
    pub ranges: Vec<ParameterRange>,
}

impl UncertaintyModel {
    /// True when the estimator fell back to the unbounded threshold.
    pub fn is_fallback(&self) -> bool {
        self.status == UncertaintyStatus::InsufficientData
    }

    pub fn is_accepted(&self, index: usize) -> bool {
        self.accepted.binary_search(&index).is_ok()
    }

    pub fn range(&self, parameter: Parameter) -> Option<&ParameterRange> {
        self.ranges.iter().find(|r| r.parameter == parameter)
    }

    /// Contour levels `(sigma, threshold)`; only available for a bounded model.
    pub fn contour_levels(&self) -> Option<ContourLevels> {
        match (self.status, self.sigma) {
            (UncertaintyStatus::Bounded, Some(sigma)) => Some(ContourLevels {
                sigma,
                threshold: self.threshold,
            }),
            _ => None,
        }
    }
}

/// The two misfit levels drawn as accepted-region boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourLevels {
    pub sigma: f64,
    pub threshold: f64,
}

/// How the fixed parameter is matched against the requested value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZMatch {
    /// Bitwise `==` on the stored value.
    Exact,
    /// `|z − value| <= tol`.
    Tolerance(f64),
}

impl ZMatch {
    pub fn matches(self, z: f64, target: f64) -> bool {
        match self {
            ZMatch::Exact => z == target,
            ZMatch::Tolerance(tol) => (z - target).abs() <= tol,
        }
    }
}

/// A 2D slice request over the misfit landscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceRequest {
    pub x: Parameter,
    pub y: Parameter,
    pub z: Parameter,
    pub z_value: f64,
    /// Grid step along x.
    pub dx: f64,
    /// Grid step along y.
    pub dy: f64,
    pub z_match: ZMatch,
}

impl SliceRequest {
    /// Request with the default grid resolution and exact z matching.
    pub fn new(x: Parameter, y: Parameter, z: Parameter, z_value: f64) -> Self {
        Self {
            x,
            y,
            z,
            z_value,
            dx: DEFAULT_SLICE_DX,
            dy: DEFAULT_SLICE_DY,
            z_match: ZMatch::Exact,
        }
    }
}

pub const DEFAULT_SLICE_DX: f64 = 0.02;
pub const DEFAULT_SLICE_DY: f64 = 0.01;

/// Minimum misfit among candidates sharing one (x, y) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlicePoint {
    pub x: f64,
    pub y: f64,
    pub misfit: f64,
}

/// Regular grid with nearest-neighbour interpolated misfit.
///
/// `values[i][j]` is the value at `(xs[i], ys[j])`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SliceGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl SliceGrid {
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty() || self.ys.is_empty()
    }
}

/// A 2D cross-section of the misfit landscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub request: SliceRequest,
    pub points: Vec<SlicePoint>,
    pub grid: SliceGrid,
    pub contour_levels: Option<ContourLevels>,
    /// Global misfit range used for colour scaling (all candidates, not just the slice).
    pub misfit_range: Option<(f64, f64)>,
}

/// Input configuration shared by the file-based commands.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub catalog_path: PathBuf,
    pub observations_path: PathBuf,
    /// Use the observation weights when present.
    pub weighted: bool,
}
