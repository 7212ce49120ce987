//! Acceptance region and parameter uncertainty.
//!
//! The minimum misfit is treated as a maximum-likelihood estimate under a
//! normal error model. With `N` observations and 6 free rupture parameters:
//!
//! - `dof = N - 6`
//! - `sigma² = min² / dof`
//! - threshold = 97.5th percentile of `Normal(min, sigma)`
//!
//! Every candidate strictly below the threshold is accepted, and the accepted
//! set's per-parameter (min, max) are the reported uncertainty bounds.
//!
//! When `N <= 6` the model is under-determined. We do not fail: the threshold
//! falls back to a large sentinel (everything is accepted) and the model is
//! flagged `InsufficientData` so callers can tell.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{info, warn};

use crate::domain::{
    BestFit, FREE_PARAMETER_COUNT, MisfitResult, Parameter, ParameterRange, UncertaintyModel,
    UncertaintyStatus,
};
use crate::error::FitError;
use crate::store::CandidateStore;

/// One-sided upper quantile of the acceptance band.
pub const ACCEPTANCE_QUANTILE: f64 = 0.975;

/// Threshold used when there are too few observations for the normal model.
pub const UNBOUNDED_THRESHOLD: f64 = 1e24;

/// Build the uncertainty model for a misfit result and its best fit.
pub fn estimate_uncertainty(
    store: &CandidateStore,
    misfit: &MisfitResult,
    best: &BestFit,
    observation_count: usize,
) -> Result<UncertaintyModel, FitError> {
    if store.is_empty() || misfit.is_empty() {
        return Err(FitError::EmptyInput(
            "uncertainty requested over an empty candidate set".to_string(),
        ));
    }
    if misfit.len() != store.len() {
        return Err(FitError::configuration(format!(
            "misfit result has {} values for {} candidates",
            misfit.len(),
            store.len()
        )));
    }
    if best.index >= misfit.len() {
        return Err(FitError::configuration(format!(
            "best-fit index {} is outside the misfit result",
            best.index
        )));
    }
    let min_misfit = misfit.values[best.index];
    if best.misfit.to_bits() != min_misfit.to_bits()
        || misfit.values.iter().any(|&v| v < min_misfit)
    {
        return Err(FitError::configuration(format!(
            "best fit {} (misfit {}) is not the minimum of this misfit result",
            best.id, best.misfit
        )));
    }

    let dof = observation_count as i64 - FREE_PARAMETER_COUNT as i64;

    let (status, sigma, threshold) = if dof <= 0 {
        warn!(
            observations = observation_count,
            "insufficient data for uncertainty estimation; accepting all candidates"
        );
        (UncertaintyStatus::InsufficientData, None, UNBOUNDED_THRESHOLD)
    } else {
        let sigma = (min_misfit * min_misfit / dof as f64).sqrt();
        let threshold = acceptance_threshold(min_misfit, sigma)?;
        info!(dof, sigma, threshold, "acceptance threshold");
        (UncertaintyStatus::Bounded, Some(sigma), threshold)
    };

    // A zero spread collapses the band onto the minimum itself.
    let collapsed = sigma == Some(0.0);
    let accepted: Vec<usize> = misfit
        .values
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m < threshold || (collapsed && m <= threshold))
        .map(|(idx, _)| idx)
        .collect();

    if accepted.is_empty() {
        return Err(FitError::EmptyAcceptedSet {
            min_misfit,
            threshold,
        });
    }

    let ranges = parameter_ranges(store, &accepted)?;

    Ok(UncertaintyModel {
        observation_count,
        degrees_of_freedom: dof,
        status,
        min_misfit,
        sigma,
        threshold,
        accepted,
        ranges,
    })
}

/// 97.5th percentile of `Normal(mean, sigma)`.
fn acceptance_threshold(mean: f64, sigma: f64) -> Result<f64, FitError> {
    if !(mean.is_finite() && sigma.is_finite()) {
        return Err(FitError::configuration(format!(
            "non-finite misfit statistics (min={mean}, sigma={sigma})"
        )));
    }
    if sigma == 0.0 {
        return Ok(mean);
    }
    let normal = Normal::new(mean, sigma).map_err(|e| {
        FitError::configuration(format!("failed to construct normal distribution: {e}"))
    })?;
    Ok(normal.inverse_cdf(ACCEPTANCE_QUANTILE))
}

/// Per-parameter (min, max) over the given candidate indices.
pub fn parameter_ranges(
    store: &CandidateStore,
    indices: &[usize],
) -> Result<Vec<ParameterRange>, FitError> {
    let mut ranges: Vec<ParameterRange> = Parameter::ALL
        .iter()
        .map(|&parameter| ParameterRange {
            parameter,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        })
        .collect();

    for &idx in indices {
        let Some(c) = store.get(idx) else {
            return Err(FitError::configuration(format!(
                "accepted index {idx} is outside the store"
            )));
        };
        for range in &mut ranges {
            let v = c.params.get(range.parameter);
            range.min = range.min.min(v);
            range.max = range.max.max(v);
        }
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{Weighting, evaluate_misfit, select_best};
    use crate::store::ObservationSet;
    use crate::store::test_support::{candidate, params};

    fn run(store: &CandidateStore, obs: &ObservationSet) -> (MisfitResult, BestFit, UncertaintyModel) {
        let misfit = evaluate_misfit(store, obs, Weighting::Uniform).unwrap();
        let best = select_best(store, &misfit).unwrap();
        let model = estimate_uncertainty(store, &misfit, &best, obs.len()).unwrap();
        (misfit, best, model)
    }

    #[test]
    fn too_few_observations_fall_back_and_accept_everything() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 105.0, -7.0), &[5.0, 5.0, 5.0]),
            candidate("c1", params(6.5, 106.0, -7.5), &[6.0, 6.0, 6.0]),
            candidate("c2", params(7.0, 107.0, -8.0), &[4.0, 4.0, 4.0]),
        ])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0]);
        let (misfit, best, model) = run(&store, &obs);

        assert_eq!(misfit.values, vec![0.0, 1.0, 1.0]);
        assert_eq!(best.index, 0);
        assert_eq!(best.misfit, 0.0);
        assert!(model.is_fallback());
        assert_eq!(model.degrees_of_freedom, -3);
        assert_eq!(model.sigma, None);
        assert_eq!(model.threshold, UNBOUNDED_THRESHOLD);
        assert_eq!(model.accepted, vec![0, 1, 2]);
        assert!(model.contour_levels().is_none());

        let mag = model.range(Parameter::Magnitude).unwrap();
        assert_eq!((mag.min, mag.max), (6.0, 7.0));
    }

    #[test]
    fn stale_best_fit_is_rejected() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 105.0, -7.0), &[5.0, 5.0, 5.0]),
            candidate("c1", params(6.5, 106.0, -7.5), &[6.0, 6.0, 6.0]),
        ])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0]);
        let (misfit, best, _) = run(&store, &obs);

        // Misfit value from another run.
        let mut stale = best.clone();
        stale.misfit = 0.5;
        let err = estimate_uncertainty(&store, &misfit, &stale, obs.len()).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));

        // Consistent value, but not the minimum.
        let not_min = BestFit {
            index: 1,
            id: "c1".to_string(),
            params: store.get(1).unwrap().params,
            misfit: misfit.values[1],
        };
        let err = estimate_uncertainty(&store, &misfit, &not_min, obs.len()).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn seven_observations_use_normal_quantile() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 105.0, -7.0), &[5.2; 7]),
            candidate("c1", params(6.5, 106.0, -7.5), &[6.0; 7]),
            candidate("c2", params(7.0, 107.0, -8.0), &[4.0; 7]),
        ])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0; 7]);
        let (_, best, model) = run(&store, &obs);

        assert!((best.misfit - 0.2).abs() < 1e-12);
        assert_eq!(model.status, UncertaintyStatus::Bounded);
        assert_eq!(model.degrees_of_freedom, 1);
        let sigma = model.sigma.unwrap();
        assert!((sigma * sigma - 0.04).abs() < 1e-12);
        // 0.2 + 0.2 * z(0.975)
        assert!((model.threshold - 0.591_992_797).abs() < 1e-6, "{}", model.threshold);
        assert_eq!(model.accepted, vec![0]);

        let lon = model.range(Parameter::Longitude).unwrap();
        assert_eq!((lon.min, lon.max), (105.0, 105.0));
    }

    #[test]
    fn threshold_bounds_best_fit_and_sigma_is_non_negative() {
        let fields: Vec<Vec<f64>> = vec![
            vec![5.0, 6.0, 4.5, 5.5, 7.0, 3.0, 5.0, 6.0],
            vec![5.5, 6.5, 4.0, 5.0, 6.5, 3.5, 5.5, 6.0],
            vec![4.0, 5.0, 4.0, 4.5, 6.0, 2.0, 4.0, 5.0],
            vec![5.1, 6.1, 4.4, 5.4, 7.1, 3.2, 5.0, 5.9],
        ];
        let store = CandidateStore::from_candidates(
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| candidate(&format!("c{i}"), params(6.0 + 0.25 * i as f64, 105.0, -7.0), f))
                .collect(),
        )
        .unwrap();
        let obs = ObservationSet::new(vec![5.0, 6.0, 4.5, 5.5, 7.0, 3.0, 5.2, 6.0]);
        let (_, best, model) = run(&store, &obs);

        assert!(model.sigma.unwrap() >= 0.0);
        assert!(model.threshold >= best.misfit);
        assert!(model.is_accepted(best.index));
    }

    #[test]
    fn perfect_fit_with_enough_data_keeps_best_fit() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 105.0, -7.0), &[5.0; 8]),
            candidate("c1", params(6.5, 105.0, -7.0), &[5.0; 8]),
            candidate("c2", params(7.0, 105.0, -7.0), &[6.0; 8]),
        ])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0; 8]);
        let (_, best, model) = run(&store, &obs);

        assert_eq!(model.sigma, Some(0.0));
        assert_eq!(model.threshold, 0.0);
        assert!(model.is_accepted(best.index));
        assert_eq!(model.accepted, vec![0, 1]);
    }

    #[test]
    fn estimation_is_idempotent() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 105.0, -7.0), &[5.3, 5.1, 4.8, 5.0, 5.0, 6.1, 4.9]),
            candidate("c1", params(6.5, 106.0, -7.5), &[5.6, 5.5, 5.0, 5.2, 5.4, 6.3, 5.0]),
        ])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0, 5.0, 5.0, 6.0, 5.0]);
        let (misfit, best, a) = run(&store, &obs);
        let b = estimate_uncertainty(&store, &misfit, &best, obs.len()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.threshold.to_bits(), b.threshold.to_bits());
    }
}
