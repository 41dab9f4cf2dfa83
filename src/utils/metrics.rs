//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};
use crate::utils::speed::MAX_CONGESTION;

/// Accuracy report attached to a trained model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelAccuracy {
    /// Mean Absolute Percentage Error, in percent.
    pub mape: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Overall accuracy score in [0, 1].
    pub accuracy: f64,
}

impl ModelAccuracy {
    /// Metrics of a perfect fit.
    pub fn perfect() -> Self {
        Self {
            mape: 0.0,
            rmse: 0.0,
            mae: 0.0,
            r2: 1.0,
            accuracy: 1.0,
        }
    }

    /// Component-wise blend of two reports.
    ///
    /// RMSE is combined as the quadratic mean, everything else as the
    /// arithmetic mean.
    pub fn blend(&self, other: &ModelAccuracy) -> ModelAccuracy {
        ModelAccuracy {
            mape: (self.mape + other.mape) / 2.0,
            rmse: ((self.rmse.powi(2) + other.rmse.powi(2)) / 2.0).sqrt(),
            mae: (self.mae + other.mae) / 2.0,
            r2: (self.r2 + other.r2) / 2.0,
            accuracy: (self.accuracy + other.accuracy) / 2.0,
        }
    }
}

/// Calculate accuracy metrics between actual and predicted congestion values.
///
/// MAPE ignores observations whose actual value is zero. The accuracy score
/// is `1 - MAPE/100`; when every actual value is zero it falls back to
/// `1 - MAE/3` (the MAE relative to the congestion scale). Both are clamped to
/// [0, 1].
pub fn calculate_accuracy(actual: &[f64], predicted: &[f64]) -> Result<ModelAccuracy> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;

    let mae: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let rmse = (ss_res / n).sqrt();

    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, _)| a.abs() > 1e-9)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();
    let mape = if percentage_errors.is_empty() {
        None
    } else {
        Some(100.0 * percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64)
    };

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r2 = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    let accuracy = match mape {
        Some(mape) => 1.0 - mape / 100.0,
        None => 1.0 - mae / MAX_CONGESTION,
    }
    .clamp(0.0, 1.0);

    Ok(ModelAccuracy {
        mape: mape.unwrap_or(0.0),
        rmse,
        mae,
        r2,
        accuracy,
    })
}
