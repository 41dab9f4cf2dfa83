//! Benchmarks for model training and ensemble forecasting.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use traffic_forecast::core::{Area, FeatureExtractor, Observation, TimeWindow, ZoneType};
use traffic_forecast::models::regression::RegressionSample;
use traffic_forecast::models::{
    EnsembleForecaster, PatternAnalyzer, RegressionModel, TimeSeriesModel,
};
use traffic_forecast::utils::speed_for_congestion;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

fn generate_daily_cycle(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0;
            1.5 + 1.2 * phase.sin() + 0.1 * ((i * 7) % 5) as f64 / 5.0
        })
        .map(|v: f64| v.clamp(0.0, 3.0))
        .collect()
}

fn generate_history(hours: usize) -> Vec<Observation> {
    let area = Area::new("bench", ZoneType::Commercial);
    generate_daily_cycle(hours)
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let ts = start() + Duration::hours(i as i64);
            Observation::new(ts, area.clone(), c, speed_for_congestion(c), 1.0 + c / 3.0).ok()
        })
        .collect()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(20);

    for hours in [168, 336, 720].iter() {
        let series = generate_daily_cycle(*hours);
        let history = generate_history(*hours);
        let extractor = FeatureExtractor::new(&history);
        let samples: Vec<RegressionSample> = history
            .iter()
            .map(|o| {
                RegressionSample::new(extractor.features_for_observation(o), o.congestion_level())
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("TimeSeries", hours), hours, |b, _| {
            b.iter(|| {
                let mut model = TimeSeriesModel::new();
                model.train(black_box(&series))
            })
        });

        group.bench_with_input(BenchmarkId::new("Regression", hours), hours, |b, _| {
            b.iter(|| {
                let mut model = RegressionModel::new();
                model.train_all(black_box(&samples))
            })
        });

        group.bench_with_input(BenchmarkId::new("Patterns", hours), hours, |b, _| {
            b.iter(|| {
                let mut analyzer = PatternAnalyzer::new();
                analyzer.analyze_all(black_box(&history))
            })
        });

        group.bench_with_input(BenchmarkId::new("Ensemble", hours), hours, |b, _| {
            b.iter(|| {
                let mut forecaster = EnsembleForecaster::new();
                forecaster.initialize(black_box(&history))
            })
        });
    }

    group.finish();
}

fn bench_forecasting(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecasting");
    let history = generate_history(336);
    let mut forecaster = EnsembleForecaster::new();
    if forecaster.initialize(&history).is_err() {
        return;
    }
    let area = Area::new("bench", ZoneType::Commercial);

    for hours in [1, 24, 168].iter() {
        let window = match TimeWindow::hours_from(start() + Duration::days(14), *hours - 1) {
            Ok(window) => window,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::new("window", hours), hours, |b, _| {
            b.iter(|| forecaster.forecast(black_box(&area), window))
        });
    }

    group.bench_function("detailed_prediction", |b| {
        let time = start() + Duration::days(14) + Duration::hours(8);
        b.iter(|| forecaster.get_detailed_prediction(black_box(&area), time))
    });

    group.finish();
}

criterion_group!(benches, bench_training, bench_forecasting);
criterion_main!(benches);
