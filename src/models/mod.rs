//! Congestion models.

mod traits;

pub mod arima;
pub mod ensemble;
pub mod pattern;
pub mod regression;

pub use arima::TimeSeriesModel;
pub use ensemble::{EnsembleConfig, EnsembleForecaster, EnsembleWeights};
pub use pattern::PatternAnalyzer;
pub use regression::RegressionModel;
pub use traits::{
    BoxedModel, CongestionModel, ModelKind, PredictionContext, TrainingSet, RECENT_WINDOW,
};
