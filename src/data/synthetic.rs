//! Synthetic rupture catalogs and observations.
//!
//! Useful for demos and tests when no real source model or historical
//! intensity data is at hand. The physics is deliberately crude:
//!
//! - `ToyAttenuation`: `ln SA = c0 + c1 (M - 6) - c2 ln(sqrt(R² + h²)) - c3 R`
//! - `LogLinearConverter`: `MMI = a + b log10(SA · 981)` clamped to `[1, 12]`
//!
//! Observations are the "true" rupture's intensity plus Gaussian noise drawn
//! from a seeded `StdRng`, so a given seed always gives the same data.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{RuptureParams, Site};
use crate::error::FitError;
use crate::source::{
    DEFAULT_PERIOD, GroundMotionModel, IntensityConverter, Rupture, build_store, scenario_intensity,
};
use crate::store::{CandidateStore, ObservationSet};

const KM_PER_DEGREE: f64 = 111.19;

/// A rupture described only by its parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRupture {
    pub id: String,
    pub params: RuptureParams,
}

impl Rupture for PointRupture {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn params(&self) -> RuptureParams {
        self.params
    }
}

/// Point-source attenuation relation with hypocentral distance.
#[derive(Debug, Clone)]
pub struct ToyAttenuation {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    /// Near-source saturation term (km).
    pub h: f64,
}

impl Default for ToyAttenuation {
    fn default() -> Self {
        Self {
            c0: 1.2,
            c1: 1.1,
            c2: 1.0,
            c3: 0.003,
            h: 6.0,
        }
    }
}

impl ToyAttenuation {
    fn hypocentral_km(params: &RuptureParams, site: &Site) -> f64 {
        let mean_lat = 0.5 * (params.latitude + site.latitude);
        let dx = (site.longitude - params.longitude) * mean_lat.to_radians().cos() * KM_PER_DEGREE;
        let dy = (site.latitude - params.latitude) * KM_PER_DEGREE;
        (dx * dx + dy * dy + params.depth * params.depth).sqrt()
    }
}

impl GroundMotionModel<PointRupture> for ToyAttenuation {
    fn name(&self) -> &str {
        "ToyAttenuation"
    }

    fn ground_motion(
        &self,
        rupture: &PointRupture,
        sites: &[Site],
        period: f64,
    ) -> Result<Vec<f64>, FitError> {
        if !(period.is_finite() && period > 0.0) {
            return Err(FitError::configuration(format!("invalid spectral period {period}")));
        }
        let p = &rupture.params;
        // Longer periods decay a little faster with magnitude saturation.
        let period_term = -0.2 * period.ln();
        Ok(sites
            .iter()
            .map(|site| {
                let r = Self::hypocentral_km(p, site);
                let ln_sa = self.c0 + period_term + self.c1 * (p.magnitude - 6.0)
                    - self.c2 * (r * r + self.h * self.h).sqrt().ln()
                    - self.c3 * r;
                ln_sa.exp()
            })
            .collect())
    }
}

/// `MMI = intercept + slope · log10(SA in cm/s²)`, clamped to the scale.
#[derive(Debug, Clone)]
pub struct LogLinearConverter {
    pub intercept: f64,
    pub slope: f64,
}

impl Default for LogLinearConverter {
    fn default() -> Self {
        Self {
            intercept: 1.0,
            slope: 2.5,
        }
    }
}

impl IntensityConverter for LogLinearConverter {
    fn to_intensity(&self, field: &[f64], _period: f64) -> Vec<f64> {
        field
            .iter()
            .map(|&sa| {
                let cms2 = (sa * 981.0).max(1e-6);
                (self.intercept + self.slope * cms2.log10()).clamp(1.0, 12.0)
            })
            .collect()
    }
}

/// Axis values for each rupture parameter; the catalog is their cartesian product.
#[derive(Debug, Clone)]
pub struct CatalogGrid {
    pub magnitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub depths: Vec<f64>,
    pub strikes: Vec<f64>,
    pub dips: Vec<f64>,
}

impl CatalogGrid {
    /// A small grid centred on `center`.
    pub fn around(center: &RuptureParams) -> Self {
        let steps = |c: f64, step: f64, n: i32| -> Vec<f64> {
            (-n..=n).map(|i| c + step * f64::from(i)).collect()
        };
        Self {
            magnitudes: steps(center.magnitude, 0.25, 2),
            longitudes: steps(center.longitude, 0.25, 3),
            latitudes: steps(center.latitude, 0.25, 3),
            depths: vec![10.0, 20.0],
            strikes: vec![center.strike],
            dips: vec![center.dip],
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
            * self.longitudes.len()
            * self.latitudes.len()
            * self.depths.len()
            * self.strikes.len()
            * self.dips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate ruptures in a fixed nested order (magnitude outermost).
    pub fn ruptures(&self) -> Vec<PointRupture> {
        let mut out = Vec::with_capacity(self.len());
        for &magnitude in &self.magnitudes {
            for &longitude in &self.longitudes {
                for &latitude in &self.latitudes {
                    for &depth in &self.depths {
                        for &strike in &self.strikes {
                            for &dip in &self.dips {
                                out.push(PointRupture {
                                    id: format!("R{:05}", out.len() + 1),
                                    params: RuptureParams {
                                        magnitude,
                                        longitude,
                                        latitude,
                                        depth,
                                        strike,
                                        dip,
                                    },
                                });
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

/// Settings for a synthetic run.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub site_count: usize,
    /// Standard deviation of the observation noise (intensity units).
    pub noise_sd: f64,
    /// Half-width of the site scatter box around the true epicentre (degrees).
    pub site_spread_deg: f64,
    pub period: f64,
    pub truth: RuptureParams,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            site_count: 24,
            noise_sd: 0.3,
            site_spread_deg: 1.5,
            period: DEFAULT_PERIOD,
            truth: RuptureParams {
                magnitude: 7.0,
                longitude: 106.0,
                latitude: -7.0,
                depth: 10.0,
                strike: 90.0,
                dip: 45.0,
            },
        }
    }
}

/// A generated catalog together with the observations it should be fitted to.
#[derive(Debug, Clone)]
pub struct SyntheticRun {
    pub store: CandidateStore,
    /// Noisy truth intensities, with the site coordinates attached.
    pub observations: ObservationSet,
    pub truth: RuptureParams,
    pub gmm_name: String,
}

pub fn generate(config: &SyntheticConfig, grid: &CatalogGrid) -> Result<SyntheticRun, FitError> {
    if config.site_count == 0 {
        return Err(FitError::configuration("site count must be > 0"));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(FitError::configuration("noise standard deviation must be >= 0"));
    }
    if !(config.site_spread_deg.is_finite() && config.site_spread_deg > 0.0) {
        return Err(FitError::configuration("site spread must be > 0"));
    }
    if grid.is_empty() {
        return Err(FitError::configuration("catalog grid has an empty axis"));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| FitError::configuration(format!("noise distribution error: {e}")))?;

    let spread = config.site_spread_deg;
    let sites: Vec<Site> = (0..config.site_count)
        .map(|_| Site {
            longitude: config.truth.longitude + rng.gen_range(-spread..=spread),
            latitude: config.truth.latitude + rng.gen_range(-spread..=spread),
        })
        .collect();

    let gmm = ToyAttenuation::default();
    let converter = LogLinearConverter::default();

    let truth = PointRupture {
        id: "truth".to_string(),
        params: config.truth,
    };
    let clean = scenario_intensity(&truth, &sites, &gmm, &converter, config.period)?;
    let values: Vec<f64> = clean
        .iter()
        .map(|v| (v + noise.sample(&mut rng)).clamp(1.0, 12.0))
        .collect();

    let store = build_store(&grid.ruptures(), &sites, &gmm, &converter, config.period)?;
    let observations = ObservationSet::new(values).with_sites(sites)?;

    Ok(SyntheticRun {
        store,
        observations,
        truth: config.truth,
        gmm_name: gmm.name().to_string(),
    })
}
