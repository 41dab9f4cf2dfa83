//! Ensemble weights and configuration.

use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaConfig;
use crate::models::regression::RegressionConfig;
use crate::models::ModelKind;
use chrono::NaiveDate;

/// Relative weight of each component in the blended prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleWeights {
    pub pattern: f64,
    pub regression: f64,
    pub time_series: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            pattern: 0.4,
            regression: 0.4,
            time_series: 0.2,
        }
    }
}

impl EnsembleWeights {
    /// Create normalised weights.
    ///
    /// # Errors
    /// `InvalidParameter` if any weight is negative or non-finite, or if
    /// they sum to zero.
    pub fn new(pattern: f64, regression: f64, time_series: f64) -> Result<Self> {
        Self {
            pattern,
            regression,
            time_series,
        }
        .normalized()
    }

    /// Scale the weights to sum to 1.
    pub fn normalized(&self) -> Result<Self> {
        let parts = [self.pattern, self.regression, self.time_series];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "ensemble weights must be finite and non-negative, got {:?}",
                parts
            )));
        }
        let sum: f64 = parts.iter().sum();
        if sum <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "ensemble weights must have a positive sum".to_string(),
            ));
        }

        Ok(Self {
            pattern: self.pattern / sum,
            regression: self.regression / sum,
            time_series: self.time_series / sum,
        })
    }

    pub fn weight(&self, kind: ModelKind) -> f64 {
        match kind {
            ModelKind::Pattern => self.pattern,
            ModelKind::Regression => self.regression,
            ModelKind::TimeSeries => self.time_series,
        }
    }
}

/// Source of the time-series share of an ensemble prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSeriesContribution {
    /// Reuse the pattern-based prediction.
    #[default]
    PatternProxy,
    /// Forecast one step ahead from the area's recent history.
    Autoregressive,
}

/// Configuration for [`EnsembleForecaster`](super::EnsembleForecaster).
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub weights: EnsembleWeights,
    /// Minimum history accepted by `initialize`.
    pub min_observations: usize,
    pub arima: ArimaConfig,
    pub regression: RegressionConfig,
    /// Dates flagged as holidays in the feature vectors.
    pub holidays: Vec<NaiveDate>,
    pub time_series: TimeSeriesContribution,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            min_observations: 50,
            arima: ArimaConfig::default(),
            regression: RegressionConfig::default(),
            holidays: Vec::new(),
            time_series: TimeSeriesContribution::default(),
        }
    }
}

impl EnsembleConfig {
    pub fn with_weights(mut self, weights: EnsembleWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_min_observations(mut self, min_observations: usize) -> Self {
        self.min_observations = min_observations;
        self
    }

    pub fn with_arima(mut self, arima: ArimaConfig) -> Self {
        self.arima = arima;
        self
    }

    pub fn with_regression(mut self, regression: RegressionConfig) -> Self {
        self.regression = regression;
        self
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays = holidays.into_iter().collect();
        self
    }

    pub fn with_time_series(mut self, contribution: TimeSeriesContribution) -> Self {
        self.time_series = contribution;
        self
    }
}
