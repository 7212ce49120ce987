//! Candidate store and observation set.
//!
//! A fitting run owns exactly one `CandidateStore` (append-only while it is
//! being filled) and one `ObservationSet`. Everything else is derived from
//! these two by pure functions in `crate::fit` and `crate::slice`.

pub mod observations;

pub use observations::*;

use serde::Serialize;

use crate::domain::{Candidate, Parameter};
use crate::error::FitError;

/// Ordered collection of evaluated ruptures.
///
/// Serialize-only: candidates are added through `push`, which checks field lengths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, checking that every intensity field has the same length.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Result<Self, FitError> {
        let mut store = Self::new();
        for c in candidates {
            store.push(c)?;
        }
        Ok(store)
    }

    /// Append a candidate. Fields must all share one site count.
    pub fn push(&mut self, candidate: Candidate) -> Result<(), FitError> {
        if let Some(n) = self.site_count() {
            if candidate.intensity.len() != n {
                return Err(FitError::configuration(format!(
                    "candidate '{}' has {} intensity values, store expects {n}",
                    candidate.id,
                    candidate.intensity.len()
                )));
            }
        }
        self.candidates.push(candidate);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Intensity field length shared by all candidates (`None` when empty).
    pub fn site_count(&self) -> Option<usize> {
        self.candidates.first().map(|c| c.intensity.len())
    }

    /// Values of one parameter across the store, in store order.
    pub fn parameter_values(&self, parameter: Parameter) -> Vec<f64> {
        self.candidates.iter().map(|c| c.params.get(parameter)).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateStore {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{Candidate, RuptureParams};

    pub fn params(magnitude: f64, longitude: f64, latitude: f64) -> RuptureParams {
        RuptureParams {
            magnitude,
            longitude,
            latitude,
            depth: 10.0,
            strike: 0.0,
            dip: 90.0,
        }
    }

    pub fn candidate(id: &str, params: RuptureParams, intensity: &[f64]) -> Candidate {
        Candidate {
            id: id.to_string(),
            params,
            intensity: intensity.to_vec(),
        }
    }
}
