//! A single ARIMA(p, d, q) candidate fitted with the damped-autocorrelation
//! heuristic.
//!
//! AR coefficients are the sample autocorrelations at lags 1..=p scaled by a
//! damping factor; MA coefficients follow a fixed ramp (`step * j` for the
//! j-th coefficient, j starting at 1). This is not a likelihood-maximising
//! estimator, only a cheap approximation that is scored by AIC.

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::difference;
use crate::utils::stats::{autocorrelation, mean};
use std::fmt;

/// Residual variance floor, keeps the log-likelihood finite for perfect fits.
const MIN_VARIANCE: f64 = 1e-10;

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1 // AR + MA + intercept
    }

    /// Minimum differenced length needed to score this order.
    pub fn min_differenced_len(&self) -> usize {
        self.p.max(self.q) + 1
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Coefficient heuristics shared by every candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heuristics {
    /// Scale applied to the sample autocorrelations.
    pub ar_damping: f64,
    /// Increment of the MA coefficient ramp.
    pub ma_step: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            ar_damping: 0.8,
            ma_step: 0.1,
        }
    }
}

/// A fitted ARIMA candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    /// One-step residuals on the differenced scale.
    residuals: Vec<f64>,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
}

impl ArimaFit {
    /// Estimate the coefficients for `order` and score them.
    ///
    /// # Errors
    /// `InvalidParameterCombination` if the differenced series is shorter than
    /// `max(p, q) + 1`; `ComputationError` if the score is not finite.
    pub fn estimate(series: &[f64], order: ArimaOrder, heuristics: Heuristics) -> Result<Self> {
        let ArimaOrder { p, d, q } = order;
        let diff = difference(series, d);

        if diff.len() < order.min_differenced_len() {
            return Err(ForecastError::InvalidParameterCombination {
                p,
                d,
                q,
                reason: format!(
                    "differenced series has {} points, need {}",
                    diff.len(),
                    order.min_differenced_len()
                ),
            });
        }

        let intercept = mean(&diff);
        let ar: Vec<f64> = (1..=p)
            .map(|lag| heuristics.ar_damping * autocorrelation(&diff, lag))
            .collect();
        let ma: Vec<f64> = (1..=q).map(|j| heuristics.ma_step * j as f64).collect();

        let residuals = Self::one_step_residuals(&diff, &ar, &ma, intercept);
        let n_eff = residuals.len() as f64;
        let rss: f64 = residuals.iter().map(|e| e * e).sum();
        let variance = (rss / n_eff).max(MIN_VARIANCE);

        let log_likelihood =
            -0.5 * n_eff * ((2.0 * std::f64::consts::PI).ln() + variance.ln() + 1.0);
        let k = order.num_params() as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();

        if !aic.is_finite() || !bic.is_finite() || ar.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "{} produced a non-finite score",
                order
            )));
        }

        Ok(Self {
            order,
            ar,
            ma,
            intercept,
            residuals,
            log_likelihood,
            aic,
            bic,
        })
    }

    /// Residuals of the combined AR + MA one-step predictor.
    fn one_step_residuals(diff: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> Vec<f64> {
        let n = diff.len();
        let start = ar.len().max(ma.len());
        let mut errors = vec![0.0; n];

        for t in start..n {
            let mut pred = intercept;

            // AR component
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (diff[t - 1 - i] - intercept);
            }

            // MA component
            for (j, theta) in ma.iter().enumerate() {
                pred += theta * errors[t - 1 - j];
            }

            errors[t] = diff[t] - pred;
        }

        errors.split_off(start)
    }

    /// Forecast `horizon` raw values following `history`.
    ///
    /// Only the AR component is projected forward. When `d > 0` each
    /// differenced-scale step is added once onto the last observed level,
    /// so higher differencing orders are carried as a single trend.
    pub fn forecast(&self, history: &[f64], horizon: usize) -> Vec<f64> {
        let mut extended = difference(history, self.order.d);
        let mut level = history.last().copied().unwrap_or(self.intercept);
        let mut out = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            extended.push(pred);

            if self.order.d == 0 {
                out.push(pred);
            } else {
                level += pred;
                out.push(level);
            }
        }
        out
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// AR coefficients followed by MA coefficients.
    pub fn coefficients(&self) -> Vec<f64> {
        self.ar.iter().chain(self.ma.iter()).copied().collect()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1.5 + (i as f64 * std::f64::consts::PI / 12.0).sin())
            .collect()
    }

    #[test]
    fn order_display_and_params() {
        let order = ArimaOrder::new(2, 1, 3);
        assert_eq!(order.to_string(), "ARIMA(2,1,3)");
        assert_eq!(order.num_params(), 6); // 2 AR + 3 MA + 1 intercept
        assert_eq!(order.min_differenced_len(), 4);
    }

    #[test]
    fn ar_coefficients_are_damped_autocorrelations() {
        let series = wave(48);
        let fit = ArimaFit::estimate(&series, ArimaOrder::new(2, 0, 0), Heuristics::default())
            .unwrap();

        assert_relative_eq!(
            fit.ar_coefficients()[0],
            0.8 * autocorrelation(&series, 1),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            fit.ar_coefficients()[1],
            0.8 * autocorrelation(&series, 2),
            epsilon = 1e-12
        );
        assert_relative_eq!(fit.intercept(), mean(&series), epsilon = 1e-12);
    }

    #[test]
    fn ma_coefficients_follow_ramp() {
        let fit = ArimaFit::estimate(&wave(48), ArimaOrder::new(0, 0, 3), Heuristics::default())
            .unwrap();
        let ma = fit.ma_coefficients();
        assert_relative_eq!(ma[0], 0.1);
        assert_relative_eq!(ma[1], 0.2);
        assert_relative_eq!(ma[2], 0.3);
        assert_eq!(fit.coefficients().len(), 3);
    }

    #[test]
    fn residuals_skip_warm_up() {
        let fit = ArimaFit::estimate(&wave(48), ArimaOrder::new(3, 1, 1), Heuristics::default())
            .unwrap();
        // 47 differenced points minus a warm-up of 3
        assert_eq!(fit.residuals().len(), 44);
    }

    #[test]
    fn information_criteria_relationship() {
        let fit = ArimaFit::estimate(&wave(60), ArimaOrder::new(1, 0, 1), Heuristics::default())
            .unwrap();
        let n = fit.residuals().len() as f64;
        assert_relative_eq!(
            fit.aic(),
            -2.0 * fit.log_likelihood() + 6.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            fit.bic(),
            -2.0 * fit.log_likelihood() + 3.0 * n.ln(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn short_differenced_series_is_rejected() {
        let series = [1.0, 2.0, 1.5, 1.0];
        // d = 2 leaves 2 points, order needs 4
        let err = ArimaFit::estimate(&series, ArimaOrder::new(3, 2, 0), Heuristics::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InvalidParameterCombination { p: 3, d: 2, q: 0, .. }
        ));
    }

    #[test]
    fn constant_series_fits_perfectly() {
        let series = vec![1.5; 30];
        let fit = ArimaFit::estimate(&series, ArimaOrder::new(1, 0, 0), Heuristics::default())
            .unwrap();
        assert!(fit.aic().is_finite());
        assert!(fit.residuals().iter().all(|e| e.abs() < 1e-12));

        let forecast = fit.forecast(&series, 4);
        for v in forecast {
            assert_relative_eq!(v, 1.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn differenced_forecast_carries_level() {
        // Linear trend: first differences are constant 0.1
        let series: Vec<f64> = (0..30).map(|i| 0.1 * i as f64).collect();
        let fit = ArimaFit::estimate(&series, ArimaOrder::new(0, 1, 0), Heuristics::default())
            .unwrap();
        let forecast = fit.forecast(&series, 3);
        assert_relative_eq!(forecast[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[1], 3.1, epsilon = 1e-9);
        assert_relative_eq!(forecast[2], 3.2, epsilon = 1e-9);
    }
}
