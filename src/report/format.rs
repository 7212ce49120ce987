//! Formatted terminal output: run summary, parameter ranges, ranked candidates.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{BestFit, MisfitResult, Parameter, UncertaintyModel};
use crate::store::CandidateStore;

/// Everything the summary needs from one run.
pub struct SummaryInput<'a> {
    pub gmm: Option<&'a str>,
    /// Spectral period (s) of the catalog intensities, when known.
    pub period: Option<f64>,
    pub store: &'a CandidateStore,
    pub observation_count: usize,
    pub misfit: &'a MisfitResult,
    pub best: &'a BestFit,
    pub uncertainty: &'a UncertaintyModel,
}

/// Format the full run summary (dataset sizes + best fit + acceptance region).
pub fn format_run_summary(input: &SummaryInput<'_>) -> String {
    let u = input.uncertainty;
    let mut out = String::new();

    out.push_str("=== mmifit - Rupture Fit to Felt Intensities ===\n");
    if let Some(gmm) = input.gmm {
        out.push_str(&format!("Ground motion: {gmm}\n"));
    }
    if let Some(period) = input.period {
        out.push_str(&format!("Period: {period} s\n"));
    }
    out.push_str(&format!(
        "Candidates: n={} | Observations: n={} | Misfit: {}\n",
        input.store.len(),
        input.observation_count,
        input.misfit.kind.label(),
    ));
    if let Some((lo, hi)) = input.misfit.range() {
        out.push_str(&format!("Misfit range: [{lo:.4}, {hi:.4}]\n"));
    }

    out.push_str("\nBest fit:\n");
    out.push_str(&format!(
        "- {} (index {}) misfit={:.4}\n",
        input.best.id, input.best.index, input.best.misfit
    ));
    for p in Parameter::ALL {
        out.push_str(&format!(
            "  {:<16} {:>10.3}\n",
            p.display_name(),
            input.best.params.get(p)
        ));
    }

    out.push_str("\nAcceptance region:\n");
    match u.contour_levels() {
        Some(levels) => {
            out.push_str(&format!(
                "- dof={} sigma={:.4} threshold={:.4} (97.5th percentile)\n",
                u.degrees_of_freedom, levels.sigma, levels.threshold
            ));
        }
        None => {
            out.push_str(&format!(
                "- insufficient data for uncertainty estimation (n={} <= 6); all candidates accepted\n",
                u.observation_count
            ));
        }
    }
    out.push_str(&format!(
        "- accepted {} of {} candidates\n",
        u.accepted.len(),
        input.store.len()
    ));

    out.push_str(&format!(
        "{:<16} {:>10} {:>10} {:>10}\n",
        "parameter", "min", "max", "width"
    ));
    out.push_str(&format!("{:-<16} {:-<10} {:-<10} {:-<10}\n", "", "", "", ""));
    for p in Parameter::ALL {
        let Some(r) = u.range(p) else {
            continue;
        };
        out.push_str(&format!(
            "{:<16} {:>10.3} {:>10.3} {:>10.3}\n",
            p.key(),
            r.min,
            r.max,
            r.width()
        ));
    }

    out
}

/// Table of the `top_n` lowest-misfit candidates.
pub fn format_top_candidates(
    store: &CandidateStore,
    misfit: &MisfitResult,
    uncertainty: &UncertaintyModel,
    top_n: usize,
) -> String {
    let mut order: Vec<usize> = (0..misfit.len().min(store.len())).collect();
    // Stable sort keeps store order on equal misfit.
    order.sort_by(|&a, &b| misfit.values[a].total_cmp(&misfit.values[b]));

    let mut out = String::new();
    out.push_str(&format!("Top {} candidates:\n", top_n.min(order.len())));
    out.push_str(
        format!(
            "{:<12} {:>6} {:>9} {:>8} {:>6} {:>7} {:>5} {:>9} {}\n",
            "id", "mag", "lon", "lat", "depth", "strike", "dip", "misfit", "ok"
        )
        .trim_end(),
    );
    out.push('\n');

    for idx in order.into_iter().take(top_n) {
        let Some(c) = store.get(idx) else {
            continue;
        };
        let p = &c.params;
        out.push_str(
            format!(
                "{:<12} {:>6.2} {:>9.3} {:>8.3} {:>6.1} {:>7.1} {:>5.1} {:>9.4} {}\n",
                truncate(&c.id, 12),
                p.magnitude,
                p.longitude,
                p.latitude,
                p.depth,
                p.strike,
                p.dip,
                misfit.values[idx],
                if uncertainty.is_accepted(idx) { "*" } else { "" },
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
