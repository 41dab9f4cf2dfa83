//! Statistical utility functions.

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of a slice, or `default` when it is empty.
pub fn mean_or(values: &[f64], default: f64) -> f64 {
    if values.is_empty() {
        default
    } else {
        mean(values)
    }
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Calculate the autocorrelation at a given lag.
///
/// A constant series has no defined correlation; it reports 0.0.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator < 1e-12 {
        return 0.0;
    }
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn mean_or_falls_back_on_empty() {
        assert_relative_eq!(mean_or(&[], 1.5), 1.5);
        assert_relative_eq!(mean_or(&[1.0, 2.0], 1.5), 1.5);
        assert_relative_eq!(mean_or(&[2.0, 2.0], 1.5), 2.0);
    }

    #[test]
    fn population_std_dev_uses_n_denominator() {
        // Population variance of [2, 4, 4, 4, 5, 5, 7, 9] = 4
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_variance(&values), 4.0, epsilon = 1e-10);
        assert_relative_eq!(population_std_dev(&values), 2.0, epsilon = 1e-10);
        assert_relative_eq!(population_std_dev(&[3.0]), 0.0);
        assert!(population_std_dev(&[]).is_nan());
    }

    #[test]
    fn autocorrelation_lag_zero_is_one() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert_relative_eq!(autocorrelation(&values, 0), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn autocorrelation_of_alternating_series_is_negative() {
        let values: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(autocorrelation(&values, 1) < -0.9);
        assert!(autocorrelation(&values, 2) > 0.8);
    }

    #[test]
    fn autocorrelation_constant_series_is_zero() {
        assert_eq!(autocorrelation(&[1.5; 10], 1), 0.0);
    }

    #[test]
    fn autocorrelation_lag_too_large() {
        assert!(autocorrelation(&[1.0, 2.0], 2).is_nan());
    }
}
