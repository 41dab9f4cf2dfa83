//! Ensemble coordinator.
//!
//! Trains the pattern, regression and time-series models on one history and
//! blends their predictions with fixed weights.

use crate::core::{
    Area, CongestionLevel, EventFactor, FactorKind, FeatureExtractor, FeatureVector, Forecast,
    ForecastModel, Observation, Prediction, PredictionFactor, PredictionResult, TimeWindow,
    WeatherConditions,
};
use crate::error::{ForecastError, Result};
use crate::models::arima::TimeSeriesModel;
use crate::models::ensemble::config::{EnsembleConfig, EnsembleWeights, TimeSeriesContribution};
use crate::models::pattern::PatternAnalyzer;
use crate::models::regression::RegressionModel;
use crate::models::{CongestionModel, ModelKind, PredictionContext, TrainingSet};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Weather score below which poor weather is reported as a factor.
const POOR_WEATHER_SCORE: f64 = 0.5;
/// Event impact above which an event is reported as a factor.
const EVENT_IMPACT: f64 = 0.5;

/// Trained sub-models and the feature index they were trained with.
#[derive(Debug, Clone)]
struct ReadyState {
    time_series: TimeSeriesModel,
    regression: RegressionModel,
    patterns: PatternAnalyzer,
    extractor: FeatureExtractor,
}

#[derive(Debug, Clone)]
enum State {
    Uninitialized,
    Ready(Box<ReadyState>),
}

/// Weighted ensemble of the pattern, regression and time-series models.
///
/// # Example
///
/// ```
/// use traffic_forecast::prelude::*;
///
/// let forecaster = EnsembleForecaster::new();
/// assert!(!forecaster.is_ready());
/// ```
#[derive(Debug, Clone)]
pub struct EnsembleForecaster {
    config: EnsembleConfig,
    state: State,
}

impl Default for EnsembleForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EnsembleForecaster {
    /// Create an uninitialised forecaster with the default configuration.
    pub fn new() -> Self {
        Self {
            config: EnsembleConfig::default(),
            state: State::Uninitialized,
        }
    }

    /// Create an uninitialised forecaster.
    ///
    /// # Errors
    /// `InvalidParameter` if the weights are negative or sum to zero.
    pub fn with_config(mut config: EnsembleConfig) -> Result<Self> {
        config.weights = config.weights.normalized()?;
        Ok(Self {
            config,
            state: State::Uninitialized,
        })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn weights(&self) -> EnsembleWeights {
        self.config.weights
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Train every sub-model on `history`.
    ///
    /// On failure the forecaster keeps its previous state.
    ///
    /// # Errors
    /// `InsufficientData` below the configured minimum history, or the first
    /// error of a sub-model.
    pub fn initialize(&mut self, history: &[Observation]) -> Result<()> {
        let needed = self.config.min_observations;
        if history.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: history.len(),
            });
        }

        let extractor =
            FeatureExtractor::new(history).with_holidays(self.config.holidays.iter().copied());
        let training = TrainingSet::new(history, &extractor);

        let mut time_series = TimeSeriesModel::with_config(self.config.arima.clone());
        let mut regression = RegressionModel::with_config(self.config.regression.clone());
        let mut patterns = PatternAnalyzer::new();

        {
            let models: [&mut dyn CongestionModel; 3] =
                [&mut time_series, &mut regression, &mut patterns];
            for model in models {
                model.train(&training)?;
                debug!(model = model.name(), kind = %model.kind(), "sub-model trained");
            }
        }

        info!(
            observations = history.len(),
            time_series_accuracy = time_series.accuracy()?.accuracy,
            regression_accuracy = regression.accuracy()?.accuracy,
            "ensemble initialised"
        );

        self.state = State::Ready(Box::new(ReadyState {
            time_series,
            regression,
            patterns,
            extractor,
        }));
        Ok(())
    }

    fn ready(&self) -> Result<&ReadyState> {
        match &self.state {
            State::Ready(state) => Ok(state.as_ref()),
            State::Uninitialized => Err(ForecastError::NotInitialized),
        }
    }

    /// Blended prediction for `area` at `time`.
    ///
    /// # Errors
    /// `NotInitialized` before a successful [`EnsembleForecaster::initialize`].
    pub fn predict_at(&self, area: &Area, time: DateTime<Utc>) -> Result<Prediction> {
        let ready = self.ready()?;
        let context = PredictionContext::new(area, time, &ready.extractor);
        self.blend(ready, &context)
    }

    /// Blended prediction using live weather and event information.
    pub fn predict_with_conditions(
        &self,
        area: &Area,
        time: DateTime<Utc>,
        weather: Option<&WeatherConditions>,
        events: &[EventFactor],
    ) -> Result<Prediction> {
        let ready = self.ready()?;
        let context =
            PredictionContext::with_conditions(area, time, &ready.extractor, weather, events);
        self.blend(ready, &context)
    }

    /// Hourly predictions over `window`, both ends inclusive.
    pub fn forecast(&self, area: &Area, window: TimeWindow) -> Result<Forecast> {
        let ready = self.ready()?;
        let predictions = window
            .hourly_steps()
            .map(|time| {
                let context = PredictionContext::new(area, time, &ready.extractor);
                self.blend(ready, &context)
            })
            .collect::<Result<Vec<_>>>()?;

        let forecast = Forecast::new(area.clone(), window, predictions, ForecastModel::Ensemble);
        debug!(
            area = %area,
            steps = forecast.horizon(),
            confidence = forecast.overall_confidence,
            "ensemble forecast"
        );
        Ok(forecast)
    }

    /// Blended prediction with contributing factors and the blended
    /// time-series and regression accuracy.
    pub fn get_detailed_prediction(
        &self,
        area: &Area,
        time: DateTime<Utc>,
    ) -> Result<PredictionResult> {
        self.detailed_prediction_with_conditions(area, time, None, &[])
    }

    /// [`EnsembleForecaster::get_detailed_prediction`] with live weather and
    /// event information.
    pub fn detailed_prediction_with_conditions(
        &self,
        area: &Area,
        time: DateTime<Utc>,
        weather: Option<&WeatherConditions>,
        events: &[EventFactor],
    ) -> Result<PredictionResult> {
        let ready = self.ready()?;
        let context =
            PredictionContext::with_conditions(area, time, &ready.extractor, weather, events);
        let prediction = self.blend(ready, &context)?;

        let accuracy = ready
            .time_series
            .accuracy()?
            .blend(&ready.regression.accuracy()?);

        Ok(PredictionResult {
            prediction,
            accuracy,
            factors: explain(&context.features),
        })
    }

    fn blend(&self, ready: &ReadyState, context: &PredictionContext<'_>) -> Result<Prediction> {
        let pattern = CongestionModel::predict(&ready.patterns, context)?;
        let regression = CongestionModel::predict(&ready.regression, context)?;
        let time_series = match self.config.time_series {
            TimeSeriesContribution::PatternProxy => pattern.clone(),
            TimeSeriesContribution::Autoregressive => {
                CongestionModel::predict(&ready.time_series, context)?
            }
        };

        Ok(combine(
            &self.config.weights,
            context.time,
            &[
                (ModelKind::Pattern, &pattern),
                (ModelKind::Regression, &regression),
                (ModelKind::TimeSeries, &time_series),
            ],
        ))
    }
}

/// Weighted average of category value, speed and confidence.
///
/// The category is re-derived from the averaged value.
fn combine(
    weights: &EnsembleWeights,
    timestamp: DateTime<Utc>,
    parts: &[(ModelKind, &Prediction)],
) -> Prediction {
    let mut value = 0.0;
    let mut speed = 0.0;
    let mut confidence = 0.0;
    for (kind, prediction) in parts {
        let w = weights.weight(*kind);
        value += w * prediction.congestion_level.as_value();
        speed += w * prediction.average_speed;
        confidence += w * prediction.confidence;
    }

    Prediction::new(
        timestamp,
        CongestionLevel::from_value(value),
        speed,
        confidence.clamp(0.1, 1.0),
    )
}

/// Factors whose triggering condition holds for `features`.
fn explain(features: &FeatureVector) -> Vec<PredictionFactor> {
    let weekday = !features.is_weekend;
    [
        (FactorKind::MorningRush, weekday && features.is_morning_rush()),
        (FactorKind::EveningRush, weekday && features.is_evening_rush()),
        (FactorKind::Weekend, features.is_weekend),
        (
            FactorKind::PoorWeather,
            features.weather_score < POOR_WEATHER_SCORE,
        ),
        (FactorKind::Event, features.event_impact > EVENT_IMPACT),
        (FactorKind::Holiday, features.is_holiday),
    ]
    .into_iter()
    .filter(|(_, applies)| *applies)
    .map(|(kind, _)| PredictionFactor::of(kind))
    .collect()
}
