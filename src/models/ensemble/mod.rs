//! Ensemble forecasting.
//!
//! Blends the pattern, regression and time-series models into a single
//! prediction with confidence and explanatory factors.

mod config;
mod forecaster;

pub use config::{EnsembleConfig, EnsembleWeights, TimeSeriesContribution};
pub use forecaster::EnsembleForecaster;
