//! Time-series model: grid-searched heuristic ARIMA over a congestion series.

use crate::core::Prediction;
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{ArimaFit, ArimaOrder, Heuristics};
use crate::utils::metrics::{calculate_accuracy, ModelAccuracy};
use crate::utils::speed::{classify, clamp_congestion};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Configuration for the order grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Coefficient heuristics.
    pub heuristics: Heuristics,
    /// Share of the series held out for the accuracy backtest.
    pub holdout_fraction: f64,
    /// Minimum series length accepted by `train`.
    pub min_observations: usize,
    /// Confidence lost per additional forecast step.
    pub confidence_decay: f64,
    /// Lowest confidence reported.
    pub min_confidence: f64,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            heuristics: Heuristics::default(),
            holdout_fraction: 0.2,
            min_observations: 24,
            confidence_decay: 0.05,
            min_confidence: 0.1,
        }
    }
}

impl ArimaConfig {
    /// Set maximum orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set the holdout share used for the accuracy backtest.
    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    /// All candidate orders in search order.
    fn candidates(&self) -> impl Iterator<Item = ArimaOrder> + '_ {
        (0..=self.max_p).flat_map(move |p| {
            (0..=self.max_d)
                .flat_map(move |d| (0..=self.max_q).map(move |q| ArimaOrder::new(p, d, q)))
        })
    }
}

/// Everything produced by one successful training run.
#[derive(Debug, Clone)]
struct TrainedState {
    fit: ArimaFit,
    series: Vec<f64>,
    accuracy: ModelAccuracy,
    scores: Vec<(ArimaOrder, f64)>,
}

/// Heuristic ARIMA forecaster for a single congestion series.
///
/// `train` searches every (p, d, q) within the configured bounds and keeps
/// the candidate with the lowest AIC. Candidates that cannot be scored are
/// skipped. The trained state is only replaced once a run succeeds.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesModel {
    config: ArimaConfig,
    state: Option<TrainedState>,
}

impl TimeSeriesModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ArimaConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &ArimaConfig {
        &self.config
    }

    /// Fit the model to a congestion series.
    ///
    /// # Errors
    /// `InsufficientData` below the configured minimum length;
    /// `ComputationError` if no candidate order could be scored.
    pub fn train(&mut self, series: &[f64]) -> Result<()> {
        if series.len() < self.config.min_observations {
            return Err(ForecastError::InsufficientData {
                needed: self.config.min_observations,
                got: series.len(),
            });
        }

        let mut best: Option<ArimaFit> = None;
        let mut scores = Vec::new();

        for order in self.config.candidates() {
            match ArimaFit::estimate(series, order, self.config.heuristics) {
                Ok(fit) => {
                    debug!(%order, aic = fit.aic(), bic = fit.bic(), "scored candidate");
                    scores.push((order, fit.aic()));
                    if best.as_ref().map_or(true, |b| fit.aic() < b.aic()) {
                        best = Some(fit);
                    }
                }
                Err(err) => {
                    debug!(%order, error = %err, "skipped candidate");
                    scores.push((order, f64::INFINITY));
                }
            }
        }

        let fit = best.ok_or_else(|| {
            ForecastError::ComputationError("no ARIMA candidate could be fitted".to_string())
        })?;
        let accuracy = self.backtest(series, fit.order())?;

        info!(
            order = %fit.order(),
            aic = fit.aic(),
            accuracy = accuracy.accuracy,
            "time-series model trained"
        );

        self.state = Some(TrainedState {
            fit,
            series: series.to_vec(),
            accuracy,
            scores,
        });
        Ok(())
    }

    /// Expanding-window one-step backtest over the held-out tail.
    ///
    /// Coefficients are re-derived for every prefix with the selected order.
    fn backtest(&self, series: &[f64], order: ArimaOrder) -> Result<ModelAccuracy> {
        let n = series.len();
        let holdout = ((n as f64 * self.config.holdout_fraction).round() as usize)
            .max(1)
            .min(n.saturating_sub(1));
        if holdout == 0 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }
        let split = n - holdout;

        let mut actual = Vec::with_capacity(holdout);
        let mut predicted = Vec::with_capacity(holdout);
        for t in split..n {
            let prefix = &series[..t];
            if let Ok(fit) = ArimaFit::estimate(prefix, order, self.config.heuristics) {
                if let Some(&next) = fit.forecast(prefix, 1).first() {
                    actual.push(series[t]);
                    predicted.push(clamp_congestion(next));
                }
            }
        }

        calculate_accuracy(&actual, &predicted)
    }

    /// Raw forecast values clamped to the congestion scale.
    ///
    /// An empty `series` forecasts from the end of the training series.
    pub fn forecast_values(&self, series: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let state = self.state.as_ref().ok_or(ForecastError::NotTrained)?;
        let history = if series.is_empty() {
            &state.series
        } else {
            series
        };
        Ok(state
            .fit
            .forecast(history, horizon)
            .into_iter()
            .map(clamp_congestion)
            .collect())
    }

    /// Forecast `horizon` hourly steps following `series`, the first at `start`.
    ///
    /// Confidence decays linearly with the step index and never drops below
    /// the configured floor.
    pub fn predict(
        &self,
        series: &[f64],
        start: DateTime<Utc>,
        horizon: usize,
    ) -> Result<Vec<Prediction>> {
        let values = self.forecast_values(series, horizon)?;
        let base = self.accuracy()?.accuracy;

        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let (level, speed) = classify(value);
                let confidence = self.step_confidence(base, i);
                Prediction::new(start + Duration::hours(i as i64), level, speed, confidence)
            })
            .collect())
    }

    fn step_confidence(&self, base: f64, step: usize) -> f64 {
        (base - self.config.confidence_decay * step as f64)
            .max(self.config.min_confidence)
            .min(1.0)
    }

    /// Backtest accuracy of the trained model.
    pub fn accuracy(&self) -> Result<ModelAccuracy> {
        self.state
            .as_ref()
            .map(|s| s.accuracy)
            .ok_or(ForecastError::NotTrained)
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// The selected candidate.
    pub fn fit(&self) -> Option<&ArimaFit> {
        self.state.as_ref().map(|s| &s.fit)
    }

    pub fn order(&self) -> Option<ArimaOrder> {
        self.fit().map(|f| f.order())
    }

    pub fn aic(&self) -> Option<f64> {
        self.fit().map(|f| f.aic())
    }

    pub fn bic(&self) -> Option<f64> {
        self.fit().map(|f| f.bic())
    }

    pub fn coefficients(&self) -> Option<Vec<f64>> {
        self.fit().map(|f| f.coefficients())
    }

    pub fn residuals(&self) -> Option<&[f64]> {
        self.fit().map(|f| f.residuals())
    }

    /// Every evaluated order with its AIC; skipped orders score infinity.
    pub fn candidate_scores(&self) -> &[(ArimaOrder, f64)] {
        self.state.as_ref().map(|s| s.scores.as_slice()).unwrap_or(&[])
    }
}
