//! Read/write candidate catalog JSON files.
//!
//! A catalog is the hand-off point from the external rupture/ground-motion
//! layer: one entry per evaluated rupture with its parameter vector and
//! predicted intensity field.
//!
//! ```json
//! { "gmm": "ToyAttenuation", "period": 1.0,
//!   "candidates": [ { "id": "R00001",
//!                     "params": { "mag": 7.0, "longitude": 106.0, "latitude": -7.0,
//!                                 "depth": 10.0, "strike": 90.0, "dip": 45.0 },
//!                     "intensity": [6.1, 5.4] } ] }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Candidate;
use crate::error::FitError;
use crate::store::CandidateStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Ground-motion model label (used in reports and figure names).
    #[serde(default)]
    pub gmm: Option<String>,
    /// Spectral period the intensities were derived from.
    #[serde(default)]
    pub period: Option<f64>,
    pub candidates: Vec<Candidate>,
}

/// Loaded catalog: the candidate store plus its metadata.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub store: CandidateStore,
    pub gmm: Option<String>,
    pub period: Option<f64>,
}

pub fn read_catalog_json(path: &Path) -> Result<Catalog, FitError> {
    let file = File::open(path)
        .map_err(|e| FitError::Io(format!("Failed to open catalog JSON '{}': {e}", path.display())))?;
    let raw: CatalogFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| FitError::Parse(format!("Invalid catalog JSON: {e}")))?;
    Ok(Catalog {
        store: CandidateStore::from_candidates(raw.candidates)?,
        gmm: raw.gmm,
        period: raw.period,
    })
}

pub fn write_catalog_json(
    path: &Path,
    store: &CandidateStore,
    gmm: Option<&str>,
    period: Option<f64>,
) -> Result<(), FitError> {
    let file = File::create(path).map_err(|e| {
        FitError::Io(format!("Failed to create catalog JSON '{}': {e}", path.display()))
    })?;
    let out = CatalogFile {
        gmm: gmm.map(str::to_string),
        period,
        candidates: store.candidates().to_vec(),
    };
    serde_json::to_writer(BufWriter::new(file), &out)
        .map_err(|e| FitError::Io(format!("Failed to write catalog JSON: {e}")))?;
    Ok(())
}
