//! Core data structures for traffic forecasting.

pub mod features;
mod forecast;
pub mod observation;
mod prediction;

pub use features::{FeatureExtractor, FeatureVector, FEATURE_COUNT};
pub use forecast::{Forecast, ForecastModel, TimeWindow};
pub use observation::{Area, EventFactor, Observation, WeatherConditions, ZoneType};
pub use prediction::{
    CongestionLevel, FactorKind, Prediction, PredictionFactor, PredictionResult,
};
