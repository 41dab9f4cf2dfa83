//! Linear and polynomial congestion regression.

use crate::core::{FeatureVector, Prediction};
use crate::error::{ForecastError, Result};
use crate::models::regression::polynomial::expand_polynomial;
use crate::utils::linalg::{dot, solve_normal_equation};
use crate::utils::metrics::{calculate_accuracy, ModelAccuracy};
use crate::utils::speed::classify;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// A feature vector paired with its observed congestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionSample {
    pub features: FeatureVector,
    pub target: f64,
}

impl RegressionSample {
    pub fn new(features: FeatureVector, target: f64) -> Self {
        Self { features, target }
    }
}

/// Configuration for regression fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionConfig {
    /// Ridge penalty added to the diagonal for polynomial fits.
    pub ridge_lambda: f64,
    /// Polynomial degree used by [`RegressionModel::train_all`].
    pub polynomial_degree: usize,
    /// Minimum number of samples for the linear fit.
    pub min_linear_samples: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            ridge_lambda: 0.01,
            polynomial_degree: 2,
            min_linear_samples: 10,
        }
    }
}

impl RegressionConfig {
    pub fn with_ridge_lambda(mut self, lambda: f64) -> Self {
        self.ridge_lambda = lambda;
        self
    }

    pub fn with_polynomial_degree(mut self, degree: usize) -> Self {
        self.polynomial_degree = degree;
        self
    }
}

/// Fitted coefficients and in-sample fit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionState {
    /// Polynomial degree of the feature expansion (1 for linear).
    pub degree: usize,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub r_squared: f64,
    pub mean_squared_error: f64,
    pub mean_absolute_error: f64,
    pub accuracy: ModelAccuracy,
}

impl RegressionState {
    /// Raw (unclamped) model output for a feature vector.
    pub fn evaluate(&self, features: &FeatureVector) -> f64 {
        let x = expand_polynomial(&features.normalized(), self.degree);
        self.intercept + dot(&self.coefficients, &x)
    }
}

/// Congestion regression over [`FeatureVector`]s.
///
/// Holds an optional linear fit and an optional polynomial fit; prediction
/// prefers the polynomial one.
#[derive(Debug, Clone, Default)]
pub struct RegressionModel {
    config: RegressionConfig,
    linear: Option<RegressionState>,
    polynomial: Option<RegressionState>,
}

impl RegressionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegressionConfig) -> Self {
        Self {
            config,
            linear: None,
            polynomial: None,
        }
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Ordinary least squares on the ten base features.
    ///
    /// # Errors
    /// `InsufficientData` below the configured minimum sample count;
    /// `SingularMatrix` if the normal equation is degenerate.
    pub fn train_linear(&mut self, samples: &[RegressionSample]) -> Result<()> {
        let needed = self.config.min_linear_samples;
        if samples.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: samples.len(),
            });
        }

        let state = fit(samples, 1, 0.0)?;
        info!(
            r_squared = state.r_squared,
            mse = state.mean_squared_error,
            "linear regression trained"
        );
        self.linear = Some(state);
        Ok(())
    }

    /// Ridge regression on polynomial-expanded features.
    ///
    /// # Errors
    /// `InvalidParameter` for degree 0; `InsufficientData` with fewer than
    /// `2 * degree` samples.
    pub fn train_polynomial(&mut self, samples: &[RegressionSample], degree: usize) -> Result<()> {
        if degree == 0 {
            return Err(ForecastError::InvalidParameter(
                "polynomial degree must be at least 1".to_string(),
            ));
        }
        if samples.len() < 2 * degree {
            return Err(ForecastError::InsufficientData {
                needed: 2 * degree,
                got: samples.len(),
            });
        }

        let state = fit(samples, degree, self.config.ridge_lambda)?;
        info!(
            degree,
            r_squared = state.r_squared,
            mse = state.mean_squared_error,
            "polynomial regression trained"
        );
        self.polynomial = Some(state);
        Ok(())
    }

    /// Train both variants.
    ///
    /// A singular linear system is tolerated when the polynomial fit
    /// succeeds, since prediction prefers the polynomial model.
    pub fn train_all(&mut self, samples: &[RegressionSample]) -> Result<()> {
        let linear = self.train_linear(samples);
        self.train_polynomial(samples, self.config.polynomial_degree)?;

        match linear {
            Err(ForecastError::SingularMatrix { pivot }) => {
                warn!(
                    pivot,
                    "linear regression is singular, relying on polynomial fit"
                );
                Ok(())
            }
            other => other,
        }
    }

    /// The fit used for prediction: polynomial if present, else linear.
    pub fn active_state(&self) -> Option<&RegressionState> {
        self.polynomial.as_ref().or(self.linear.as_ref())
    }

    pub fn linear_state(&self) -> Option<&RegressionState> {
        self.linear.as_ref()
    }

    pub fn polynomial_state(&self) -> Option<&RegressionState> {
        self.polynomial.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.active_state().is_some()
    }

    /// Point prediction for a feature vector at `timestamp`.
    ///
    /// # Errors
    /// `NoTrainedModel` if neither variant is trained.
    pub fn predict(&self, features: &FeatureVector, timestamp: DateTime<Utc>) -> Result<Prediction> {
        let state = self.active_state().ok_or(ForecastError::NoTrainedModel)?;
        let (level, speed) = classify(state.evaluate(features));
        let confidence = adjusted_confidence(state.accuracy.accuracy, features);

        Ok(Prediction::new(
            timestamp,
            level,
            speed.clamp(5.0, 60.0),
            confidence,
        ))
    }

    /// Accuracy of the active fit.
    pub fn accuracy(&self) -> Result<ModelAccuracy> {
        self.active_state()
            .map(|s| s.accuracy)
            .ok_or(ForecastError::NoTrainedModel)
    }
}

/// Scale the model accuracy by the conditions of the request.
fn adjusted_confidence(base: f64, features: &FeatureVector) -> f64 {
    let mut confidence = base;
    if features.weather_score < 0.3 {
        confidence *= 0.8;
    }
    if features.event_impact > 0.7 {
        confidence *= 0.7;
    }
    if features.is_morning_rush() || features.is_evening_rush() {
        confidence *= 1.1;
    }
    if features.is_night() {
        confidence *= 0.9;
    }
    confidence.clamp(0.1, 1.0)
}

fn fit(samples: &[RegressionSample], degree: usize, lambda: f64) -> Result<RegressionState> {
    let design: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let mut row = vec![1.0];
            row.extend(expand_polynomial(&s.features.normalized(), degree));
            row
        })
        .collect();
    let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();

    let beta = solve_normal_equation(&design, &targets, lambda)?;
    let fitted: Vec<f64> = design.iter().map(|row| dot(row, &beta)).collect();
    let accuracy = calculate_accuracy(&targets, &fitted)?;

    Ok(RegressionState {
        degree,
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        r_squared: accuracy.r2,
        mean_squared_error: accuracy.rmse.powi(2),
        mean_absolute_error: accuracy.mae,
        accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CongestionLevel, ZoneType};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// Samples whose features all vary, with congestion linear in the
    /// hour and weather features.
    fn varied_samples(n: usize) -> Vec<RegressionSample> {
        let zones = [
            ZoneType::Residential,
            ZoneType::Commercial,
            ZoneType::Industrial,
            ZoneType::Highway,
            ZoneType::Mixed,
        ];
        (0..n)
            .map(|i| {
                let ts = base() + Duration::hours(i as i64 * 13) + Duration::days(i as i64 * 9);
                let mut fv = FeatureVector::for_time(&ts, zones[i % zones.len()]);
                fv.is_holiday = i % 7 == 3;
                fv.weather_score = ((i * 37) % 11) as f64 / 10.0;
                fv.event_impact = ((i * 17) % 5) as f64 / 4.0;
                fv.historical_average = ((i * 29) % 13) as f64 / 4.5;
                fv.recent_trend = ((i * 23) % 9) as f64 / 4.0 - 1.0;
                let target = 0.5 + 1.5 * (fv.hour as f64 / 23.0) + 0.6 * (1.0 - fv.weather_score);
                RegressionSample::new(fv, target)
            })
            .collect()
    }

    fn constant_feature_samples(n: usize) -> Vec<RegressionSample> {
        (0..n)
            .map(|i| {
                let ts = base() + Duration::hours(i as i64);
                let fv = FeatureVector::for_time(&ts, ZoneType::Commercial);
                RegressionSample::new(fv, 1.0 + (i % 3) as f64 * 0.2)
            })
            .collect()
    }

    #[test]
    fn linear_requires_ten_samples() {
        let mut model = RegressionModel::new();
        assert!(matches!(
            model.train_linear(&varied_samples(9)),
            Err(ForecastError::InsufficientData { needed: 10, got: 9 })
        ));
    }

    #[test]
    fn polynomial_requires_twice_degree_samples() {
        let mut model = RegressionModel::new();
        assert!(matches!(
            model.train_polynomial(&varied_samples(5), 3),
            Err(ForecastError::InsufficientData { needed: 6, got: 5 })
        ));
        assert!(matches!(
            model.train_polynomial(&varied_samples(5), 0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(model.train_polynomial(&varied_samples(6), 3).is_ok());
    }

    #[test]
    fn linear_recovers_exact_relationship() {
        let samples = varied_samples(80);
        let mut model = RegressionModel::new();
        model.train_linear(&samples).unwrap();

        let state = model.linear_state().unwrap();
        assert_eq!(state.coefficients.len(), 10);
        assert_relative_eq!(state.intercept, 1.1, epsilon = 1e-6);
        assert_relative_eq!(state.coefficients[0], 1.5, epsilon = 1e-6);
        assert_relative_eq!(state.coefficients[5], -0.6, epsilon = 1e-6);
        assert_relative_eq!(state.r_squared, 1.0, epsilon = 1e-9);
        assert!(state.mean_squared_error < 1e-12);
        assert!(state.mean_absolute_error < 1e-6);
    }

    #[test]
    fn constant_feature_column_is_singular_for_linear_fit() {
        let samples = constant_feature_samples(20);
        let mut model = RegressionModel::new();
        assert!(matches!(
            model.train_linear(&samples),
            Err(ForecastError::SingularMatrix { .. })
        ));
        assert!(!model.is_trained());
    }

    #[test]
    fn train_all_tolerates_singular_linear_fit() {
        let samples = constant_feature_samples(20);
        let mut model = RegressionModel::new();
        model.train_all(&samples).unwrap();

        assert!(model.linear_state().is_none());
        let poly = model.polynomial_state().unwrap();
        assert_eq!(poly.degree, 2);
        assert_eq!(poly.coefficients.len(), 65);
    }

    #[test]
    fn predict_prefers_polynomial() {
        let samples = varied_samples(120);
        let mut model = RegressionModel::new();
        model.train_all(&samples).unwrap();
        assert!(model.linear_state().is_some());
        assert_eq!(model.active_state().unwrap().degree, 2);
    }

    #[test]
    fn predict_requires_training() {
        let model = RegressionModel::new();
        let fv = FeatureVector::for_time(&base(), ZoneType::Mixed);
        assert!(matches!(
            model.predict(&fv, base()),
            Err(ForecastError::NoTrainedModel)
        ));
        assert!(matches!(
            model.accuracy(),
            Err(ForecastError::NoTrainedModel)
        ));
    }

    #[test]
    fn prediction_matches_fitted_relationship() {
        let samples = varied_samples(80);
        let mut model = RegressionModel::new();
        model.train_linear(&samples).unwrap();

        // 23:00 in perfect weather: 0.5 + 1.5 = 2.0 -> high
        let ts = Utc.with_ymd_and_hms(2024, 6, 12, 23, 0, 0).unwrap();
        let fv = FeatureVector::for_time(&ts, ZoneType::Commercial);
        let prediction = model.predict(&fv, ts).unwrap();
        assert_eq!(prediction.congestion_level, CongestionLevel::High);
        assert_relative_eq!(prediction.average_speed, 15.0, epsilon = 1e-4);
        assert_eq!(prediction.timestamp, ts);
    }

    #[test]
    fn confidence_adjustments() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 12, 13, 0, 0).unwrap();
        let neutral = FeatureVector::for_time(&ts, ZoneType::Mixed);
        assert_relative_eq!(adjusted_confidence(0.8, &neutral), 0.8);

        let mut stormy = neutral.clone();
        stormy.weather_score = 0.1;
        assert_relative_eq!(adjusted_confidence(0.8, &stormy), 0.64, epsilon = 1e-12);

        let mut event = neutral.clone();
        event.event_impact = 0.9;
        assert_relative_eq!(adjusted_confidence(0.8, &event), 0.56, epsilon = 1e-12);

        let mut rush = neutral.clone();
        rush.hour = 8;
        assert_relative_eq!(adjusted_confidence(0.8, &rush), 0.88, epsilon = 1e-12);
        assert_relative_eq!(adjusted_confidence(0.95, &rush), 1.0);

        let mut night = neutral.clone();
        night.hour = 3;
        assert_relative_eq!(adjusted_confidence(0.8, &night), 0.72, epsilon = 1e-12);
        assert_relative_eq!(adjusted_confidence(0.05, &night), 0.1);
    }
}
