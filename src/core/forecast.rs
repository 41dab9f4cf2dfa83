//! Windowed forecast result structure.

use crate::core::{Area, Prediction};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Inclusive time range a forecast covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window.
    ///
    /// # Errors
    /// `InvalidParameter` if `latest` precedes `earliest`.
    pub fn new(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Result<Self> {
        if latest < earliest {
            return Err(ForecastError::InvalidParameter(format!(
                "time window ends ({}) before it starts ({})",
                latest, earliest
            )));
        }
        Ok(Self { earliest, latest })
    }

    /// Window of `hours` hours starting at `start`.
    pub fn hours_from(start: DateTime<Utc>, hours: i64) -> Result<Self> {
        Self::new(start, start + Duration::hours(hours))
    }

    /// Hourly steps from `earliest` to `latest`, both inclusive.
    pub fn hourly_steps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let hours = (self.latest - self.earliest).num_hours();
        (0..=hours).map(move |h| self.earliest + Duration::hours(h))
    }

    pub fn duration(&self) -> Duration {
        self.latest - self.earliest
    }
}

/// Identifier of the method that produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastModel {
    /// Weighted blend of the trained models.
    Ensemble,
    /// Pattern tables only; used by callers when the ensemble is unavailable.
    PatternFallback,
    /// Naive extrapolation of recent readings.
    BasicExtrapolation,
}

impl ForecastModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastModel::Ensemble => "ensemble_ml_models",
            ForecastModel::PatternFallback => "pattern_analysis_fallback",
            ForecastModel::BasicExtrapolation => "basic_extrapolation",
        }
    }
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered predictions for an area over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub area: Area,
    pub window: TimeWindow,
    pub predictions: Vec<Prediction>,
    /// Mean of the per-step confidences.
    pub overall_confidence: f64,
    pub model: ForecastModel,
}

impl Forecast {
    /// Build a forecast, deriving the overall confidence from the steps.
    pub fn new(
        area: Area,
        window: TimeWindow,
        predictions: Vec<Prediction>,
        model: ForecastModel,
    ) -> Self {
        let overall_confidence = if predictions.is_empty() {
            0.0
        } else {
            predictions.iter().map(|p| p.confidence).sum::<f64>() / predictions.len() as f64
        };
        Self {
            area,
            window,
            predictions,
            overall_confidence,
            model,
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Mean of the per-step average speeds.
    pub fn average_speed(&self) -> Option<f64> {
        if self.predictions.is_empty() {
            return None;
        }
        Some(
            self.predictions.iter().map(|p| p.average_speed).sum::<f64>()
                / self.predictions.len() as f64,
        )
    }

    /// The most congested step; the earliest wins ties.
    pub fn peak(&self) -> Option<&Prediction> {
        self.predictions.iter().reduce(|best, p| {
            if p.congestion_level > best.congestion_level {
                p
            } else {
                best
            }
        })
    }
}
