//! Data sources that stand in for the external rupture/ground-motion layer.

pub mod synthetic;

pub use synthetic::{
    CatalogGrid, LogLinearConverter, PointRupture, SyntheticConfig, SyntheticRun, ToyAttenuation,
    generate,
};
