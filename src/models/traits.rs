//! Common capability interface shared by the congestion models.

use crate::core::{
    Area, EventFactor, FeatureExtractor, FeatureVector, Observation, Prediction,
    WeatherConditions,
};
use crate::error::{ForecastError, Result};
use crate::models::arima::TimeSeriesModel;
use crate::models::pattern::PatternAnalyzer;
use crate::models::regression::{RegressionModel, RegressionSample};
use crate::utils::metrics::ModelAccuracy;
use chrono::{DateTime, Utc};
use std::fmt;

/// Number of recent readings carried in a [`PredictionContext`].
pub const RECENT_WINDOW: usize = 48;

/// Component of the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Pattern,
    Regression,
    TimeSeries,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Pattern,
        ModelKind::Regression,
        ModelKind::TimeSeries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Pattern => "pattern",
            ModelKind::Regression => "regression",
            ModelKind::TimeSeries => "time_series",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a model may train on, derived once from a history.
#[derive(Debug, Clone)]
pub struct TrainingSet<'a> {
    /// The raw history.
    pub observations: &'a [Observation],
    /// Congestion values in timestamp order.
    pub series: Vec<f64>,
    /// Each observation's features paired with its congestion.
    pub samples: Vec<RegressionSample>,
}

impl<'a> TrainingSet<'a> {
    pub fn new(observations: &'a [Observation], extractor: &FeatureExtractor) -> Self {
        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.timestamp());
        let series = ordered.iter().map(|o| o.congestion_level()).collect();

        let samples = observations
            .iter()
            .map(|o| {
                RegressionSample::new(extractor.features_for_observation(o), o.congestion_level())
            })
            .collect();

        Self {
            observations,
            series,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// A prediction request with its derived inputs.
#[derive(Debug, Clone)]
pub struct PredictionContext<'a> {
    pub area: &'a Area,
    pub time: DateTime<Utc>,
    pub features: FeatureVector,
    /// The area's most recent congestion values before `time`, oldest first.
    pub recent: Vec<f64>,
}

impl<'a> PredictionContext<'a> {
    pub fn new(area: &'a Area, time: DateTime<Utc>, extractor: &FeatureExtractor) -> Self {
        Self::with_conditions(area, time, extractor, None, &[])
    }

    /// Context for a request with live weather and event information.
    pub fn with_conditions(
        area: &'a Area,
        time: DateTime<Utc>,
        extractor: &FeatureExtractor,
        weather: Option<&WeatherConditions>,
        events: &[EventFactor],
    ) -> Self {
        Self {
            area,
            time,
            features: extractor.features_with_conditions(area, &time, weather, events),
            recent: extractor.recent_values(&area.id, &time, RECENT_WINDOW),
        }
    }
}

/// Common interface for the congestion models.
///
/// This trait is object-safe and can be used with `Box<dyn CongestionModel>`.
pub trait CongestionModel {
    /// Get the model name.
    fn name(&self) -> &str;

    /// The ensemble component this model provides.
    fn kind(&self) -> ModelKind;

    /// Fit the model, replacing any previous state only on success.
    fn train(&mut self, data: &TrainingSet<'_>) -> Result<()>;

    /// Predict congestion for a single request.
    fn predict(&self, context: &PredictionContext<'_>) -> Result<Prediction>;

    /// Accuracy of the trained model.
    fn accuracy(&self) -> Result<ModelAccuracy>;

    /// Check if the model has been trained.
    fn is_trained(&self) -> bool;
}

/// Type alias for boxed model trait objects.
pub type BoxedModel = Box<dyn CongestionModel>;

impl CongestionModel for TimeSeriesModel {
    fn name(&self) -> &str {
        "HeuristicARIMA"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::TimeSeries
    }

    fn train(&mut self, data: &TrainingSet<'_>) -> Result<()> {
        TimeSeriesModel::train(self, &data.series)
    }

    /// One step ahead of the context's recent values, or of the training
    /// tail when the area has no history.
    fn predict(&self, context: &PredictionContext<'_>) -> Result<Prediction> {
        TimeSeriesModel::predict(self, &context.recent, context.time, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ForecastError::ComputationError("empty time-series forecast".to_string())
            })
    }

    fn accuracy(&self) -> Result<ModelAccuracy> {
        TimeSeriesModel::accuracy(self)
    }

    fn is_trained(&self) -> bool {
        TimeSeriesModel::is_trained(self)
    }
}

impl CongestionModel for RegressionModel {
    fn name(&self) -> &str {
        "PolynomialRegression"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Regression
    }

    fn train(&mut self, data: &TrainingSet<'_>) -> Result<()> {
        self.train_all(&data.samples)
    }

    fn predict(&self, context: &PredictionContext<'_>) -> Result<Prediction> {
        RegressionModel::predict(self, &context.features, context.time)
    }

    fn accuracy(&self) -> Result<ModelAccuracy> {
        RegressionModel::accuracy(self)
    }

    fn is_trained(&self) -> bool {
        RegressionModel::is_trained(self)
    }
}

impl CongestionModel for PatternAnalyzer {
    fn name(&self) -> &str {
        "PatternAnalysis"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Pattern
    }

    fn train(&mut self, data: &TrainingSet<'_>) -> Result<()> {
        self.analyze_all(data.observations)
    }

    fn predict(&self, context: &PredictionContext<'_>) -> Result<Prediction> {
        self.predict_based_on_patterns(context.area, context.time)
    }

    fn accuracy(&self) -> Result<ModelAccuracy> {
        PatternAnalyzer::accuracy(self)
    }

    fn is_trained(&self) -> bool {
        PatternAnalyzer::is_trained(self)
    }
}
