//! Shared "fit pipeline" logic used by both the CLI and the TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> misfit -> best fit -> uncertainty -> (slice)
//!
//! The front-ends can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::domain::{BestFit, FitConfig, MisfitResult, Slice, SliceRequest, UncertaintyModel, ZMatch};
use crate::error::FitError;
use crate::fit::{Weighting, estimate_uncertainty, evaluate_misfit, select_best};
use crate::io::{Catalog, load_observations, read_catalog_json};
use crate::slice::build_slice;
use crate::store::{CandidateStore, ObservationSet};

/// Catalog and observations as read from disk.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub catalog: Catalog,
    pub observations: ObservationSet,
}

/// All computed outputs of a single fit.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub misfit: MisfitResult,
    pub best: BestFit,
    pub uncertainty: UncertaintyModel,
}

/// Which slice to take, before the best fit is known.
#[derive(Debug, Clone, Copy)]
pub struct SliceSpec {
    pub x: crate::domain::Parameter,
    pub y: crate::domain::Parameter,
    pub z: crate::domain::Parameter,
    /// `None`: use the best fit's value of `z`.
    pub z_value: Option<f64>,
    pub dx: f64,
    pub dy: f64,
    pub z_tolerance: Option<f64>,
}

impl SliceSpec {
    /// Resolve into a concrete request, pinning `z` to the best fit when unset.
    pub fn resolve(&self, best: &BestFit) -> SliceRequest {
        let z_value = self.z_value.unwrap_or_else(|| best.params.get(self.z));
        let mut request = SliceRequest::new(self.x, self.y, self.z, z_value);
        request.dx = self.dx;
        request.dy = self.dy;
        if let Some(tol) = self.z_tolerance {
            request.z_match = ZMatch::Tolerance(tol);
        }
        request
    }
}

pub fn load_inputs(config: &FitConfig) -> Result<LoadedInputs, FitError> {
    let catalog = read_catalog_json(&config.catalog_path)?;
    let observations = load_observations(&config.observations_path)?;
    info!(
        candidates = catalog.store.len(),
        observations = observations.len(),
        "loaded inputs"
    );
    Ok(LoadedInputs {
        catalog,
        observations,
    })
}

pub fn weighting_for(config: &FitConfig) -> Weighting {
    if config.weighted {
        Weighting::Observed
    } else {
        Weighting::Uniform
    }
}

/// Execute misfit -> best fit -> uncertainty.
pub fn run_fit(
    store: &CandidateStore,
    observations: &ObservationSet,
    weighting: Weighting,
) -> Result<RunOutput, FitError> {
    let misfit = evaluate_misfit(store, observations, weighting)?;
    let best = select_best(store, &misfit)?;
    let uncertainty = estimate_uncertainty(store, &misfit, &best, observations.len())?;
    Ok(RunOutput {
        misfit,
        best,
        uncertainty,
    })
}

/// Build a slice through a finished run, with contour levels attached.
pub fn run_slice(store: &CandidateStore, run: &RunOutput, spec: &SliceSpec) -> Result<Slice, FitError> {
    let request = spec.resolve(&run.best);
    build_slice(store, &run.misfit, &request, Some(&run.uncertainty))
}
