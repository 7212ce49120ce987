//! Best-fit selection over a misfit result.

use tracing::info;

use crate::domain::{BestFit, MisfitResult};
use crate::error::FitError;
use crate::store::CandidateStore;

/// Index and value of the smallest misfit.
///
/// Ties go to the lowest index; NaN never wins.
pub fn argmin(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best
}

/// Pick the candidate with the minimum misfit.
pub fn select_best(store: &CandidateStore, misfit: &MisfitResult) -> Result<BestFit, FitError> {
    if store.is_empty() || misfit.is_empty() {
        return Err(FitError::EmptyInput(
            "best fit requested over an empty candidate set".to_string(),
        ));
    }
    if misfit.len() != store.len() {
        return Err(FitError::configuration(format!(
            "misfit result has {} values for {} candidates",
            misfit.len(),
            store.len()
        )));
    }

    let Some((index, value)) = argmin(&misfit.values) else {
        return Err(FitError::EmptyInput(
            "every misfit value is NaN".to_string(),
        ));
    };
    let Some(candidate) = store.get(index) else {
        return Err(FitError::configuration(format!(
            "best-fit index {index} is outside the store"
        )));
    };

    info!(id = %candidate.id, index, misfit = value, "selected best fit");

    Ok(BestFit {
        index,
        id: candidate.id.clone(),
        params: candidate.params,
        misfit: value,
    })
}
