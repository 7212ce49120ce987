//! Per-candidate misfit against observed intensities.
//!
//! Given:
//! - predicted intensity fields `p_i` (one per candidate)
//! - observed intensities `o_i`
//! - optional weights `w_i`
//!
//! we compute, for each candidate:
//! - unweighted: `sqrt(Σ (p_i - o_i)² / N)` (RMSE)
//! - weighted: `Σ ŵ_i (p_i - o_i)²` with `ŵ` normalized to sum to 1
//!
//! The weighted form is deliberately left un-rooted, so the two kinds are only
//! comparable within themselves.

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{MisfitKind, MisfitResult};
use crate::error::FitError;
use crate::store::{CandidateStore, ObservationSet};

/// How observations are weighted in the misfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Ignore any weights on the observation set.
    Uniform,
    /// Use the observation set's weights (error if it has none).
    Observed,
}

/// Evaluate every candidate against the observations.
///
/// Candidates are evaluated in parallel; the output keeps store order so
/// downstream tie-breaks stay deterministic.
pub fn evaluate_misfit(
    store: &CandidateStore,
    observations: &ObservationSet,
    weighting: Weighting,
) -> Result<MisfitResult, FitError> {
    check_alignment(store, observations)?;

    let obs = observations.values();
    let (kind, values) = match weighting {
        Weighting::Uniform => {
            let n = obs.len() as f64;
            let values: Vec<f64> = store
                .candidates()
                .par_iter()
                .map(|c| (squared_residual_sum(&c.intensity, obs) / n).sqrt())
                .collect();
            (MisfitKind::Rmse, values)
        }
        Weighting::Observed => {
            let Some(weights) = observations.normalized_weights()? else {
                return Err(FitError::configuration(
                    "weighted misfit requested but observations carry no weights",
                ));
            };
            let values: Vec<f64> = store
                .candidates()
                .par_iter()
                .map(|c| weighted_squared_residual_sum(&c.intensity, obs, &weights))
                .collect();
            (MisfitKind::WeightedSumSquares, values)
        }
    };

    debug!(
        candidates = store.len(),
        sites = obs.len(),
        kind = kind.label(),
        "evaluated misfit"
    );

    Ok(MisfitResult { kind, values })
}

/// Raw `Σ (p_i - o_i)²` per candidate.
pub fn sum_of_squares(
    store: &CandidateStore,
    observations: &ObservationSet,
) -> Result<Vec<f64>, FitError> {
    check_alignment(store, observations)?;
    let obs = observations.values();
    Ok(store
        .candidates()
        .par_iter()
        .map(|c| squared_residual_sum(&c.intensity, obs))
        .collect())
}

fn check_alignment(store: &CandidateStore, observations: &ObservationSet) -> Result<(), FitError> {
    if store.is_empty() {
        return Err(FitError::EmptyInput(
            "no candidates to evaluate".to_string(),
        ));
    }
    if observations.is_empty() {
        return Err(FitError::configuration("observation set is empty"));
    }
    let n = observations.len();
    if let Some(c) = store.iter().find(|c| c.intensity.len() != n) {
        return Err(FitError::configuration(format!(
            "candidate '{}' has {} intensity values but there are {n} observations",
            c.id,
            c.intensity.len()
        )));
    }
    Ok(())
}

fn squared_residual_sum(predicted: &[f64], observed: &[f64]) -> f64 {
    predicted
        .iter()
        .zip(observed)
        .map(|(p, o)| {
            let r = p - o;
            r * r
        })
        .sum()
}

fn weighted_squared_residual_sum(predicted: &[f64], observed: &[f64], weights: &[f64]) -> f64 {
    predicted
        .iter()
        .zip(observed)
        .zip(weights)
        .map(|((p, o), w)| {
            let r = p - o;
            w * r * r
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{candidate, params};

    fn scenario_store() -> CandidateStore {
        CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 0.0, 0.0), &[5.0, 5.0, 5.0]),
            candidate("c1", params(6.5, 0.0, 0.0), &[6.0, 6.0, 6.0]),
            candidate("c2", params(7.0, 0.0, 0.0), &[4.0, 4.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn unweighted_misfit_is_rmse() {
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0]);
        let result = evaluate_misfit(&scenario_store(), &obs, Weighting::Uniform).unwrap();
        assert_eq!(result.kind, MisfitKind::Rmse);
        assert_eq!(result.values, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn rmse_divides_by_site_count() {
        let store = CandidateStore::from_candidates(vec![candidate(
            "c0",
            params(6.0, 0.0, 0.0),
            &[7.0, 5.0, 5.0, 5.0],
        )])
        .unwrap();
        let obs = ObservationSet::new(vec![5.0; 4]);
        let result = evaluate_misfit(&store, &obs, Weighting::Uniform).unwrap();
        // sqrt(4 / 4)
        assert!((result.values[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_weights_reduce_to_mean_squared_error() {
        let store = CandidateStore::from_candidates(vec![
            candidate("c0", params(6.0, 0.0, 0.0), &[5.5, 4.0, 6.0, 5.0]),
            candidate("c1", params(6.5, 0.0, 0.0), &[3.0, 5.0, 5.0, 7.5]),
        ])
        .unwrap();
        let values = vec![5.0, 5.0, 5.5, 6.0];
        let plain = ObservationSet::new(values.clone());
        let weighted = ObservationSet::with_weights(values, vec![2.0; 4]).unwrap();

        let rmse = evaluate_misfit(&store, &plain, Weighting::Uniform).unwrap();
        let wss = evaluate_misfit(&store, &weighted, Weighting::Observed).unwrap();
        assert_eq!(wss.kind, MisfitKind::WeightedSumSquares);
        for (r, w) in rmse.values.iter().zip(&wss.values) {
            assert!((r * r - w).abs() < 1e-12, "rmse²={} wss={w}", r * r);
        }
    }

    #[test]
    fn weighted_misfit_is_not_square_rooted() {
        let store = CandidateStore::from_candidates(vec![candidate(
            "c0",
            params(6.0, 0.0, 0.0),
            &[7.0, 5.0],
        )])
        .unwrap();
        let obs = ObservationSet::with_weights(vec![5.0, 5.0], vec![3.0, 1.0]).unwrap();
        let result = evaluate_misfit(&store, &obs, Weighting::Observed).unwrap();
        // 0.75 * 4 + 0.25 * 0
        assert!((result.values[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_mode_requires_weights() {
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0]);
        let err = evaluate_misfit(&scenario_store(), &obs, Weighting::Observed).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn invalid_weights_fail_weighted_evaluation() {
        for weights in [vec![1.0, -1.0, 1.0], vec![1.0, f64::NAN, 1.0]] {
            let obs = ObservationSet::with_weights(vec![5.0, 5.0, 5.0], weights).unwrap();
            let err = evaluate_misfit(&scenario_store(), &obs, Weighting::Observed).unwrap_err();
            assert!(matches!(err, FitError::Configuration(_)));
        }
    }

    #[test]
    fn misaligned_observations_are_a_configuration_error() {
        let obs = ObservationSet::new(vec![5.0, 5.0]);
        let err = evaluate_misfit(&scenario_store(), &obs, Weighting::Uniform).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn empty_store_is_empty_input() {
        let obs = ObservationSet::new(vec![5.0]);
        let err = evaluate_misfit(&CandidateStore::new(), &obs, Weighting::Uniform).unwrap_err();
        assert!(matches!(err, FitError::EmptyInput(_)));
    }

    #[test]
    fn evaluation_is_bit_identical_across_calls() {
        let obs = ObservationSet::new(vec![5.1, 4.9, 5.3]);
        let store = scenario_store();
        let a = evaluate_misfit(&store, &obs, Weighting::Uniform).unwrap();
        let b = evaluate_misfit(&store, &obs, Weighting::Uniform).unwrap();
        let bits = |r: &MisfitResult| r.values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn sum_of_squares_is_unnormalized() {
        let obs = ObservationSet::new(vec![5.0, 5.0, 5.0]);
        let ss = sum_of_squares(&scenario_store(), &obs).unwrap();
        assert_eq!(ss, vec![0.0, 3.0, 3.0]);
    }
}
