//! Property-based tests for the congestion models.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated congestion histories.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use traffic_forecast::core::features::FeatureVector;
use traffic_forecast::core::{Area, CongestionLevel, Observation, ZoneType};
use traffic_forecast::models::regression::RegressionSample;
use traffic_forecast::models::{
    EnsembleForecaster, PatternAnalyzer, RegressionModel, TimeSeriesModel,
};
use traffic_forecast::utils::speed_for_congestion;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Build hourly observations for one area from congestion values.
fn make_history(values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let ts = base() + Duration::hours(i as i64);
            let area = Area::new("grid-1", ZoneType::Mixed);
            Observation::new(ts, area, c, speed_for_congestion(c), 1.0 + c / 3.0).unwrap()
        })
        .collect()
}

/// Strategy for congestion series on the [0, 3] scale.
fn congestion_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(0.0..=3.0_f64, len))
}

/// Strategy for a daily-cycle series with noise.
fn daily_cycle_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (0.5..1.5_f64, prop::collection::vec(-0.3..0.3_f64, len)).prop_map(|(amplitude, noise)| {
            noise
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let phase = 2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0;
                    (1.5 + amplitude * phase.sin() + n).clamp(0.0, 3.0)
                })
                .collect()
        })
    })
}

fn feature_strategy() -> impl Strategy<Value = FeatureVector> {
    (0i64..24 * 365, 0.0..=1.0_f64, 0.0..=1.0_f64, 0.0..=3.0_f64, -1.0..=1.0_f64).prop_map(
        |(hours, weather, event, average, trend)| FeatureVector {
            weather_score: weather,
            event_impact: event,
            historical_average: average,
            recent_trend: trend,
            ..FeatureVector::for_time(&(base() + Duration::hours(hours)), ZoneType::Highway)
        },
    )
}

// =============================================================================
// Property: Category mapping is monotone and total
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn category_mapping_is_monotone(a in -1.0..4.0_f64, b in -1.0..4.0_f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(CongestionLevel::from_value(lo) <= CongestionLevel::from_value(hi));
    }

    #[test]
    fn speed_is_bounded_and_decreasing(a in 0.0..=3.0_f64, b in 0.0..=3.0_f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (s_lo, s_hi) = (speed_for_congestion(lo), speed_for_congestion(hi));
        prop_assert!((8.0..=45.0).contains(&s_lo));
        prop_assert!(s_hi <= s_lo + 1e-12);
    }
}

// =============================================================================
// Property: Time-series predictions stay in range
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn time_series_predictions_are_bounded(
        values in congestion_strategy(24, 80),
        horizon in 1usize..24
    ) {
        let mut model = TimeSeriesModel::new();
        model.train(&values).unwrap();
        let predictions = model.predict(&values, base(), horizon).unwrap();

        prop_assert_eq!(predictions.len(), horizon);
        for p in &predictions {
            prop_assert!((0.1..=1.0).contains(&p.confidence), "confidence {}", p.confidence);
            prop_assert!(p.average_speed > 0.0 && p.average_speed <= 60.0);
        }
    }

    #[test]
    fn time_series_confidence_mostly_non_increasing(
        values in daily_cycle_strategy(30, 100),
        horizon in 2usize..30
    ) {
        let mut model = TimeSeriesModel::new();
        model.train(&values).unwrap();
        let predictions = model.predict(&values, base(), horizon).unwrap();

        let pairs = predictions.windows(2).count();
        let non_increasing = predictions
            .windows(2)
            .filter(|w| w[1].confidence <= w[0].confidence)
            .count();
        prop_assert!(non_increasing as f64 >= 0.7 * pairs as f64);
    }

    #[test]
    fn constant_series_forecasts_moderate(
        level in 0.6..1.45_f64,
        horizon in 1usize..12
    ) {
        let values = vec![level; 100];
        let mut model = TimeSeriesModel::new();
        model.train(&values).unwrap();

        for p in model.predict(&values, base(), horizon).unwrap() {
            prop_assert_eq!(p.congestion_level, CongestionLevel::Moderate);
        }
    }
}

// =============================================================================
// Property: Regression and pattern predictions stay in range
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn regression_predictions_are_bounded(
        samples in prop::collection::vec((feature_strategy(), 0.0..=3.0_f64), 12..60),
        query in feature_strategy()
    ) {
        let samples: Vec<RegressionSample> = samples
            .into_iter()
            .map(|(f, t)| RegressionSample::new(f, t))
            .collect();
        let mut model = RegressionModel::new();
        model.train_polynomial(&samples, 2).unwrap();

        let p = model.predict(&query, base()).unwrap();
        prop_assert!((5.0..=60.0).contains(&p.average_speed));
        prop_assert!((0.1..=1.0).contains(&p.confidence));
    }

    #[test]
    fn pattern_predictions_are_bounded(
        values in congestion_strategy(1, 200),
        offset in 0i64..24 * 400
    ) {
        let mut analyzer = PatternAnalyzer::new();
        analyzer.analyze_all(&make_history(&values)).unwrap();

        let area = Area::new("grid-1", ZoneType::Mixed);
        let p = analyzer
            .predict_based_on_patterns(&area, base() + Duration::hours(offset))
            .unwrap();
        prop_assert!((5.0..=60.0).contains(&p.average_speed));
        prop_assert!((0.1..=1.0).contains(&p.confidence));
    }
}

// =============================================================================
// Property: Ensemble predictions stay in range
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn ensemble_predictions_are_bounded(
        values in daily_cycle_strategy(50, 120),
        offset in 0i64..24 * 30
    ) {
        let mut forecaster = EnsembleForecaster::new();
        forecaster.initialize(&make_history(&values)).unwrap();

        let area = Area::new("grid-1", ZoneType::Mixed);
        let time = base() + Duration::hours(values.len() as i64 + offset);
        let p = forecaster.predict_at(&area, time).unwrap();
        prop_assert!((0.1..=1.0).contains(&p.confidence));
        prop_assert!(p.average_speed > 0.0 && p.average_speed <= 60.0);

        let detail = forecaster.get_detailed_prediction(&area, time).unwrap();
        prop_assert_eq!(detail.prediction, p);
        prop_assert!((0.0..=1.0).contains(&detail.accuracy.accuracy));
    }
}
