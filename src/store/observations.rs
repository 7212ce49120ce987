//! Observed intensities and optional per-site weights.

use serde::Serialize;

use crate::domain::Site;
use crate::error::FitError;

/// Observed intensity per site, index-aligned with every candidate's field.
/// Serialize-only: construction goes through the checked constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSet {
    values: Vec<f64>,
    weights: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sites: Option<Vec<Site>>,
}

impl ObservationSet {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            weights: None,
            sites: None,
        }
    }

    /// Observations with per-site weights (same length as `values`).
    pub fn with_weights(values: Vec<f64>, weights: Vec<f64>) -> Result<Self, FitError> {
        if weights.len() != values.len() {
            return Err(FitError::configuration(format!(
                "{} weights supplied for {} observations",
                weights.len(),
                values.len()
            )));
        }
        Ok(Self {
            values,
            weights: Some(weights),
            sites: None,
        })
    }

    /// Attach site coordinates (same length as `values`).
    pub fn with_sites(mut self, sites: Vec<Site>) -> Result<Self, FitError> {
        if sites.len() != self.values.len() {
            return Err(FitError::configuration(format!(
                "{} sites supplied for {} observations",
                sites.len(),
                self.values.len()
            )));
        }
        self.sites = Some(sites);
        Ok(self)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn sites(&self) -> Option<&[Site]> {
        self.sites.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Weights scaled to sum to 1.
    ///
    /// Rejects non-finite or negative weights and a non-positive total.
    pub fn normalized_weights(&self) -> Result<Option<Vec<f64>>, FitError> {
        let Some(weights) = &self.weights else {
            return Ok(None);
        };
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FitError::configuration(
                "weights must be finite and non-negative",
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(FitError::configuration("weights must not sum to zero"));
        }
        Ok(Some(weights.iter().map(|w| w / total).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_must_match_observation_count() {
        let err = ObservationSet::with_weights(vec![5.0, 6.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let obs = ObservationSet::with_weights(vec![5.0, 6.0, 7.0], vec![1.0, 2.0, 1.0]).unwrap();
        let w = obs.normalized_weights().unwrap().unwrap();
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((w[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_total_is_rejected() {
        let obs = ObservationSet::with_weights(vec![5.0, 6.0], vec![0.0, 0.0]).unwrap();
        assert!(obs.normalized_weights().is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let obs = ObservationSet::with_weights(vec![5.0, 6.0], vec![1.0, -1.0]).unwrap();
        let err = obs.normalized_weights().unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let obs = ObservationSet::with_weights(vec![5.0, 6.0], vec![1.0, bad]).unwrap();
            let err = obs.normalized_weights().unwrap_err();
            assert!(matches!(err, FitError::Configuration(_)));
        }
    }
}
