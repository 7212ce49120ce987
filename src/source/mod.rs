//! Seams to the upstream collaborators.
//!
//! The engine never builds ruptures or computes ground motion itself. It only
//! needs:
//!
//! - ruptures that expose a parameter vector (`Rupture`)
//! - a ground-motion model producing a spectral field per site (`GroundMotionModel`)
//! - a converter from spectral values to felt intensity (`IntensityConverter`)
//!
//! `build_store` wires these together into a `CandidateStore`.

use tracing::debug;

use crate::domain::{Candidate, RuptureParams, Site};
use crate::error::FitError;
use crate::store::CandidateStore;

/// Spectral period (seconds) used when none is specified.
pub const DEFAULT_PERIOD: f64 = 1.0;

/// A rupture realization drawn from a source model.
pub trait Rupture {
    fn id(&self) -> String;
    fn params(&self) -> RuptureParams;
}

/// Median ground-motion field for a rupture at a set of sites.
pub trait GroundMotionModel<R: Rupture> {
    /// Short label used in reports and figure names.
    fn name(&self) -> &str;

    /// Spectral acceleration (g) at `period`, one value per site.
    fn ground_motion(&self, rupture: &R, sites: &[Site], period: f64) -> Result<Vec<f64>, FitError>;
}

/// Maps spectral acceleration to a felt-intensity scale.
pub trait IntensityConverter {
    fn to_intensity(&self, field: &[f64], period: f64) -> Vec<f64>;
}

/// Evaluate every rupture at the sites and collect the results as candidates.
pub fn build_store<R, G, C>(
    ruptures: &[R],
    sites: &[Site],
    gmm: &G,
    converter: &C,
    period: f64,
) -> Result<CandidateStore, FitError>
where
    R: Rupture,
    G: GroundMotionModel<R>,
    C: IntensityConverter,
{
    let mut store = CandidateStore::new();
    for rupture in ruptures {
        let intensity = scenario_intensity(rupture, sites, gmm, converter, period)?;
        store.push(Candidate {
            id: rupture.id(),
            params: rupture.params(),
            intensity,
        })?;
    }
    debug!(
        ruptures = ruptures.len(),
        sites = sites.len(),
        gmm = gmm.name(),
        "built candidate store"
    );
    Ok(store)
}

/// Intensity field for a single rupture, e.g. the best fit on a denser site set.
pub fn scenario_intensity<R, G, C>(
    rupture: &R,
    sites: &[Site],
    gmm: &G,
    converter: &C,
    period: f64,
) -> Result<Vec<f64>, FitError>
where
    R: Rupture,
    G: GroundMotionModel<R>,
    C: IntensityConverter,
{
    let field = gmm.ground_motion(rupture, sites, period)?;
    if field.len() != sites.len() {
        return Err(FitError::configuration(format!(
            "ground-motion model '{}' returned {} values for {} sites (rupture '{}')",
            gmm.name(),
            field.len(),
            sites.len(),
            rupture.id()
        )));
    }
    let intensity = converter.to_intensity(&field, period);
    if intensity.len() != sites.len() {
        return Err(FitError::configuration(format!(
            "intensity converter returned {} values for {} sites",
            intensity.len(),
            sites.len()
        )));
    }
    Ok(intensity)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(RuptureParams);

    impl Rupture for Fixed {
        fn id(&self) -> String {
            format!("m{:.1}", self.0.magnitude)
        }

        fn params(&self) -> RuptureParams {
            self.0
        }
    }

    /// Returns magnitude at every site, optionally dropping the last one.
    struct Flat {
        truncate: bool,
    }

    impl GroundMotionModel<Fixed> for Flat {
        fn name(&self) -> &str {
            "flat"
        }

        fn ground_motion(&self, rupture: &Fixed, sites: &[Site], _period: f64) -> Result<Vec<f64>, FitError> {
            let n = if self.truncate { sites.len() - 1 } else { sites.len() };
            Ok(vec![rupture.0.magnitude; n])
        }
    }

    struct Identity;

    impl IntensityConverter for Identity {
        fn to_intensity(&self, field: &[f64], _period: f64) -> Vec<f64> {
            field.to_vec()
        }
    }

    fn fixed(magnitude: f64) -> Fixed {
        Fixed(RuptureParams {
            magnitude,
            longitude: 105.0,
            latitude: -7.0,
            depth: 10.0,
            strike: 0.0,
            dip: 90.0,
        })
    }

    fn sites(n: usize) -> Vec<Site> {
        (0..n)
            .map(|i| Site {
                longitude: 105.0 + i as f64,
                latitude: -7.0,
            })
            .collect()
    }

    #[test]
    fn build_store_keeps_rupture_order() {
        let store = build_store(
            &[fixed(6.0), fixed(7.0)],
            &sites(3),
            &Flat { truncate: false },
            &Identity,
            DEFAULT_PERIOD,
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().id, "m7.0");
        assert_eq!(store.get(1).unwrap().intensity, vec![7.0; 3]);
    }

    #[test]
    fn short_field_is_a_configuration_error() {
        let err = build_store(
            &[fixed(6.0)],
            &sites(3),
            &Flat { truncate: true },
            &Identity,
            DEFAULT_PERIOD,
        )
        .unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }
}
