//! Exports: per-candidate results, run summary, slice points.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! plotting scripts; the JSON summary carries everything a reporting layer needs.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{BestFit, MisfitKind, MisfitResult, Parameter, Slice, UncertaintyModel};
use crate::error::FitError;
use crate::store::{CandidateStore, ObservationSet};

/// Serialized run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub tool: &'static str,
    pub generated: DateTime<Utc>,
    pub gmm: Option<&'a str>,
    pub period: Option<f64>,
    pub candidates: usize,
    pub observations: usize,
    pub misfit_kind: MisfitKind,
    pub best: &'a BestFit,
    pub uncertainty: &'a UncertaintyModel,
}

fn create_csv(path: &Path, what: &str) -> Result<csv::Writer<File>, FitError> {
    csv::Writer::from_path(path)
        .map_err(|e| FitError::Io(format!("Failed to create {what} '{}': {e}", path.display())))
}

fn write_err(what: &str) -> impl Fn(csv::Error) -> FitError + '_ {
    move |e| FitError::Io(format!("Failed to write {what}: {e}"))
}

/// Write one row per candidate: id, parameters, misfit, accepted flag.
///
/// Ids are quoted as needed, so commas or quotes in an id survive a round trip.
pub fn write_results_csv(
    path: &Path,
    store: &CandidateStore,
    misfit: &MisfitResult,
    uncertainty: &UncertaintyModel,
) -> Result<(), FitError> {
    let mut wtr = create_csv(path, "results CSV")?;
    let on_err = write_err("results CSV");

    let mut header = vec!["id"];
    header.extend(Parameter::ALL.iter().map(|p| p.key()));
    header.extend(["misfit", "accepted"]);
    wtr.write_record(&header).map_err(&on_err)?;

    for (idx, (c, m)) in store.iter().zip(&misfit.values).enumerate() {
        let mut row = vec![c.id.clone()];
        row.extend(Parameter::ALL.iter().map(|&p| c.params.get(p).to_string()));
        row.push(format!("{m:.6}"));
        row.push(uncertainty.is_accepted(idx).to_string());
        wtr.write_record(&row).map_err(&on_err)?;
    }
    wtr.flush()
        .map_err(|e| FitError::Io(format!("Failed to write results CSV: {e}")))?;
    Ok(())
}

/// Write the run summary as pretty JSON.
pub fn write_summary_json(path: &Path, summary: &RunSummary<'_>) -> Result<(), FitError> {
    let file = File::create(path).map_err(|e| {
        FitError::Io(format!("Failed to create summary JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| FitError::Io(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

/// Write the collapsed `(x, y, misfit)` slice points.
pub fn write_slice_csv(path: &Path, slice: &Slice) -> Result<(), FitError> {
    let mut wtr = create_csv(path, "slice CSV")?;
    let on_err = write_err("slice CSV");

    wtr.write_record([slice.request.x.key(), slice.request.y.key(), "min_misfit"])
        .map_err(&on_err)?;
    for p in &slice.points {
        wtr.write_record([p.x.to_string(), p.y.to_string(), format!("{:.6}", p.misfit)])
            .map_err(&on_err)?;
    }
    wtr.flush()
        .map_err(|e| FitError::Io(format!("Failed to write slice CSV: {e}")))?;
    Ok(())
}

/// Write observations in the schema `load_observations` reads back.
pub fn write_observations_csv(path: &Path, observations: &ObservationSet) -> Result<(), FitError> {
    let mut wtr = create_csv(path, "observations CSV")?;
    let on_err = write_err("observations CSV");

    let sites = observations.sites();
    let weights = observations.weights();
    let mut header = vec!["mmi"];
    if weights.is_some() {
        header.push("weight");
    }
    if sites.is_some() {
        header.extend(["lon", "lat"]);
    }
    wtr.write_record(&header).map_err(&on_err)?;

    for (i, v) in observations.values().iter().enumerate() {
        let mut row = vec![format!("{v:.4}")];
        if let Some(w) = weights {
            row.push(w[i].to_string());
        }
        if let Some(s) = sites {
            row.push(format!("{:.4}", s[i].longitude));
            row.push(format!("{:.4}", s[i].latitude));
        }
        wtr.write_record(&row).map_err(&on_err)?;
    }
    wtr.flush()
        .map_err(|e| FitError::Io(format!("Failed to write observations CSV: {e}")))?;
    Ok(())
}

/// Conventional figure file name for a rendered slice.
///
/// `rmse_slice_{comment}_{z}_{zvalue:.2}_{x}_{y}_{model}.png`, with `()` removed
/// so names stay shell-friendly for model labels like `Model()`.
pub fn slice_figure_name(comment: Option<&str>, slice: &Slice, model: &str) -> String {
    let r = &slice.request;
    format!(
        "rmse_slice_{}_{}_{:.2}_{}_{}_{}.png",
        comment.unwrap_or("None"),
        r.z.key(),
        r.z_value,
        r.x.key(),
        r.y.key(),
        model
    )
    .replace("()", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SliceGrid, SliceRequest};

    #[test]
    fn figure_name_follows_convention() {
        let slice = Slice {
            request: SliceRequest::new(Parameter::Longitude, Parameter::Latitude, Parameter::Magnitude, 7.0),
            points: vec![],
            grid: SliceGrid::default(),
            contour_levels: None,
            misfit_range: None,
        };
        assert_eq!(
            slice_figure_name(Some("1867"), &slice, "ToyAttenuation()"),
            "rmse_slice_1867_mag_7.00_longitude_latitude_ToyAttenuation.png"
        );
        assert!(slice_figure_name(None, &slice, "gmm").starts_with("rmse_slice_None_mag"));
    }

    #[test]
    fn results_csv_quotes_awkward_ids() {
        use crate::fit::{Weighting, estimate_uncertainty, evaluate_misfit, select_best};
        use crate::store::test_support::{candidate, params};

        let ids = ["plain", "sunda, west", "the \"big\" one"];
        let store = CandidateStore::from_candidates(
            ids.iter()
                .zip([5.0, 6.0, 7.0])
                .map(|(id, mmi)| candidate(id, params(6.0 + mmi / 10.0, 105.0, -7.0), &[mmi]))
                .collect(),
        )
        .unwrap();
        let obs = ObservationSet::new(vec![5.0]);
        let misfit = evaluate_misfit(&store, &obs, Weighting::Uniform).unwrap();
        let best = select_best(&store, &misfit).unwrap();
        let model = estimate_uncertainty(&store, &misfit, &best, obs.len()).unwrap();

        let path = std::env::temp_dir().join(format!("mmifit-results-{}.csv", std::process::id()));
        write_results_csv(&path, &store, &misfit, &model).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let _ = std::fs::remove_file(&path);

        assert_eq!(headers.len(), Parameter::ALL.len() + 3);
        assert_eq!(rows.len(), 3);
        for (row, id) in rows.iter().zip(ids) {
            assert_eq!(row.len(), headers.len());
            assert_eq!(&row[0], id);
        }
        assert_eq!(&rows[1][headers.len() - 2], "1.000000");
    }

    #[test]
    fn summary_json_carries_period() {
        let best = BestFit {
            index: 0,
            id: "c0".to_string(),
            params: crate::store::test_support::params(7.0, 105.0, -7.0),
            misfit: 0.25,
        };
        let uncertainty = UncertaintyModel {
            observation_count: 3,
            degrees_of_freedom: -3,
            status: crate::domain::UncertaintyStatus::InsufficientData,
            min_misfit: 0.25,
            sigma: None,
            threshold: crate::fit::UNBOUNDED_THRESHOLD,
            accepted: vec![0],
            ranges: vec![],
        };
        let summary = RunSummary {
            tool: "mmifit",
            generated: Utc::now(),
            gmm: Some("ToyAttenuation"),
            period: Some(1.0),
            candidates: 1,
            observations: 3,
            misfit_kind: MisfitKind::Rmse,
            best: &best,
            uncertainty: &uncertainty,
        };
        let path = std::env::temp_dir().join(format!("mmifit-summary-{}.json", std::process::id()));
        write_summary_json(&path, &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["period"], 1.0);
        assert_eq!(value["gmm"], "ToyAttenuation");
        assert_eq!(value["best"]["id"], "c0");
    }

    #[test]
    fn observations_csv_is_readable_by_loader() {
        let path = std::env::temp_dir().join(format!("mmifit-obs-{}.csv", std::process::id()));
        let obs = ObservationSet::with_weights(vec![5.5, 6.25], vec![1.0, 2.0]).unwrap();
        write_observations_csv(&path, &obs).unwrap();

        let back = crate::io::load_observations(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back.values(), &[5.5, 6.25]);
        assert_eq!(back.weights(), Some(&[1.0, 2.0][..]));
        assert!(back.sites().is_none());
    }
}
