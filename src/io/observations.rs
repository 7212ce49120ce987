//! Observation CSV ingest.
//!
//! Schema (header names are case-insensitive, a UTF-8 BOM is tolerated):
//!
//! | column | required | meaning |
//! |---|---|---|
//! | `mmi` (or `intensity`) | yes | observed intensity |
//! | `weight` | no | per-site weight |
//! | `lon`/`longitude`, `lat`/`latitude` | no | site coordinates |
//!
//! Rows are index-aligned with every candidate's intensity field, so unlike a
//! typical ingest we cannot skip a bad row: any row error fails the load.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::Site;
use crate::error::FitError;
use crate::store::ObservationSet;

/// Load observations from a CSV file.
pub fn load_observations(path: &Path) -> Result<ObservationSet, FitError> {
    let file = File::open(path).map_err(|e| {
        FitError::Io(format!("Failed to open observations CSV '{}': {e}", path.display()))
    })?;
    read_observations(file)
}

/// Parse observations from any CSV reader.
pub fn read_observations<R: Read>(input: R) -> Result<ObservationSet, FitError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| FitError::Parse(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mmi_col = find_column(&header_map, &["mmi", "intensity"])
        .ok_or_else(|| FitError::Parse("Missing required column 'mmi'.".to_string()))?;
    let weight_col = find_column(&header_map, &["weight"]);
    let lon_col = find_column(&header_map, &["lon", "longitude"]);
    let lat_col = find_column(&header_map, &["lat", "latitude"]);

    let mut values = Vec::new();
    let mut weights = Vec::new();
    let mut sites = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header row.
        let line = idx + 2;
        let record =
            result.map_err(|e| FitError::Parse(format!("line {line}: CSV parse error: {e}")))?;

        values.push(parse_required(&record, mmi_col, "mmi", line)?);

        if let Some(col) = weight_col {
            weights.push(parse_required(&record, col, "weight", line)?);
        }
        if let (Some(lon), Some(lat)) = (lon_col, lat_col) {
            sites.push(Site {
                longitude: parse_required(&record, lon, "lon", line)?,
                latitude: parse_required(&record, lat, "lat", line)?,
            });
        }
    }

    if values.is_empty() {
        return Err(FitError::Parse("Observation file has no rows.".to_string()));
    }

    let set = if weight_col.is_some() {
        ObservationSet::with_weights(values, weights)?
    } else {
        ObservationSet::new(values)
    };
    if sites.is_empty() {
        Ok(set)
    } else {
        set.with_sites(sites)
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn parse_required(record: &StringRecord, col: usize, name: &str, line: usize) -> Result<f64, FitError> {
    let raw = record
        .get(col)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FitError::Parse(format!("line {line}: missing value for '{name}'")))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| FitError::Parse(format!("line {line}: invalid {name} '{raw}'")))?;
    if !value.is_finite() {
        return Err(FitError::Parse(format!("line {line}: non-finite {name}")));
    }
    Ok(value)
}
