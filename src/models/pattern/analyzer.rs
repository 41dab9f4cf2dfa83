//! Descriptive pattern analysis over historical observations.

use crate::core::features::DEFAULT_CONGESTION;
use crate::core::observation::{is_rush_hour, is_weekend, weekday_index};
use crate::core::{Area, CongestionLevel, Observation, Prediction};
use crate::error::{ForecastError, Result};
use crate::models::pattern::tables::{
    CongestionPattern, DayOfWeekPattern, HourlyPattern, PatternType, SeasonalPattern,
    TriggerCondition,
};
use crate::utils::metrics::{calculate_accuracy, ModelAccuracy};
use crate::utils::speed::{clamp_congestion, speed_for_congestion};
use crate::utils::stats::{mean, mean_or, population_std_dev};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Congestion above which an observation counts towards peak probability.
const PEAK_THRESHOLD: f64 = 2.0;
/// Offset from the day mean that marks an hour peak or off-peak.
const PEAK_MARGIN: f64 = 0.5;
/// Offset from the cross-month mean that marks a congested month.
const SEASONAL_MARGIN: f64 = 0.5;
const WEEKEND_FACTOR: f64 = 0.7;
/// Months (0-based) in which a detected seasonal pattern applies.
const WINTER_MONTHS: [usize; 4] = [10, 11, 0, 1];

/// Pattern-based congestion estimate before categorisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternEstimate {
    pub congestion: f64,
    pub speed: f64,
    pub confidence: f64,
}

/// Hourly, weekly, seasonal and recurring-event congestion patterns.
///
/// Every `analyze_*` call recomputes and overwrites its table.
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    hourly: Vec<HourlyPattern>,
    daily: Vec<DayOfWeekPattern>,
    seasonal: Vec<SeasonalPattern>,
    patterns: Vec<CongestionPattern>,
    accuracy: Option<ModelAccuracy>,
}

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all four analyses and score the resulting estimates in-sample.
    ///
    /// # Errors
    /// `EmptyData` when `data` is empty.
    pub fn analyze_all(&mut self, data: &[Observation]) -> Result<()> {
        if data.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        self.analyze_hourly(data);
        self.analyze_day_of_week(data);
        self.analyze_seasonal(data);
        self.detect_congestion_patterns(data);

        let actual: Vec<f64> = data.iter().map(|o| o.congestion_level()).collect();
        let estimated: Vec<f64> = data
            .iter()
            .map(|o| self.estimate(&o.timestamp()).congestion)
            .collect();
        let accuracy = calculate_accuracy(&actual, &estimated)?;
        self.accuracy = Some(accuracy);

        info!(
            observations = data.len(),
            patterns = self.patterns.len(),
            accuracy = accuracy.accuracy,
            "pattern analysis complete"
        );
        Ok(())
    }

    /// Per-hour statistics.
    ///
    /// Hours without data take the previous hour's average (1.5 for a leading
    /// gap) with a standard deviation of 0.5 and peak probability of 0.1.
    pub fn analyze_hourly(&mut self, data: &[Observation]) -> &[HourlyPattern] {
        let mut buckets: Vec<Vec<&Observation>> = vec![Vec::new(); 24];
        for obs in data {
            buckets[obs.hour()].push(obs);
        }

        let mut table: Vec<HourlyPattern> = Vec::with_capacity(24);
        for (hour, bucket) in buckets.iter().enumerate() {
            let entry = if bucket.is_empty() {
                let average = table
                    .last()
                    .map(|p| p.average_congestion)
                    .unwrap_or(DEFAULT_CONGESTION);
                HourlyPattern {
                    hour,
                    average_congestion: average,
                    std_dev: 0.5,
                    peak_probability: 0.1,
                    typical_speed: speed_for_congestion(average),
                    sample_count: 0,
                }
            } else {
                let levels: Vec<f64> = bucket.iter().map(|o| o.congestion_level()).collect();
                let speeds: Vec<f64> = bucket.iter().map(|o| o.average_speed()).collect();
                let peaks = levels.iter().filter(|&&c| c > PEAK_THRESHOLD).count();
                HourlyPattern {
                    hour,
                    average_congestion: mean(&levels),
                    std_dev: population_std_dev(&levels),
                    peak_probability: peaks as f64 / levels.len() as f64,
                    typical_speed: mean(&speeds),
                    sample_count: bucket.len(),
                }
            };
            table.push(entry);
        }

        self.hourly = table;
        &self.hourly
    }

    /// Per-weekday statistics with peak and off-peak hours.
    pub fn analyze_day_of_week(&mut self, data: &[Observation]) -> &[DayOfWeekPattern] {
        let mut buckets: Vec<Vec<&Observation>> = vec![Vec::new(); 7];
        for obs in data {
            buckets[obs.weekday()].push(obs);
        }

        self.daily = buckets
            .iter()
            .enumerate()
            .map(|(day, bucket)| {
                let levels: Vec<f64> = bucket.iter().map(|o| o.congestion_level()).collect();
                let day_mean = mean_or(&levels, DEFAULT_CONGESTION);

                let mut by_hour: Vec<Vec<f64>> = vec![Vec::new(); 24];
                for obs in bucket {
                    by_hour[obs.hour()].push(obs.congestion_level());
                }

                let mut peak_hours = Vec::new();
                let mut off_peak_hours = Vec::new();
                for (hour, values) in by_hour.iter().enumerate() {
                    if values.is_empty() {
                        continue;
                    }
                    let hour_mean = mean(values);
                    if hour_mean > day_mean + PEAK_MARGIN {
                        peak_hours.push(hour);
                    } else if hour_mean < day_mean - PEAK_MARGIN {
                        off_peak_hours.push(hour);
                    }
                }

                DayOfWeekPattern {
                    day,
                    average_congestion: day_mean,
                    peak_hours,
                    off_peak_hours,
                    weekend_factor: if day == 0 || day == 6 {
                        WEEKEND_FACTOR
                    } else {
                        1.0
                    },
                    sample_count: bucket.len(),
                }
            })
            .collect();
        &self.daily
    }

    /// Per-month statistics and multipliers.
    pub fn analyze_seasonal(&mut self, data: &[Observation]) -> &[SeasonalPattern] {
        let mut buckets: Vec<Vec<&Observation>> = vec![Vec::new(); 12];
        for obs in data {
            buckets[obs.month()].push(obs);
        }

        self.seasonal = buckets
            .iter()
            .enumerate()
            .map(|(month, bucket)| {
                let levels: Vec<f64> = bucket.iter().map(|o| o.congestion_level()).collect();

                let rainfall: Vec<f64> = bucket
                    .iter()
                    .filter_map(|o| o.weather().map(|w| w.rainfall))
                    .collect();
                let visibility: Vec<f64> = bucket
                    .iter()
                    .filter_map(|o| o.weather().map(|w| w.visibility))
                    .collect();
                let weather_impact_factor = if rainfall.is_empty() {
                    1.0
                } else {
                    1.0 + mean(&rainfall) / 10.0 + (10.0 - mean(&visibility)) / 20.0
                };

                SeasonalPattern {
                    month,
                    average_congestion: mean_or(&levels, DEFAULT_CONGESTION),
                    weather_impact_factor,
                    holiday_impact_factor: if month == 11 || month == 0 { 1.2 } else { 1.0 },
                    school_season_factor: if month == 5 || month == 6 { 0.8 } else { 1.0 },
                    sample_count: bucket.len(),
                }
            })
            .collect();
        &self.seasonal
    }

    /// Detect rush-hour, event, weather and seasonal congestion patterns.
    ///
    /// A pattern is reported only when the history contains triggering
    /// observations for it.
    pub fn detect_congestion_patterns(&mut self, data: &[Observation]) -> &[CongestionPattern] {
        let mut patterns = Vec::new();

        let rush: Vec<&Observation> = data.iter().filter(|o| is_rush_hour(o.hour())).collect();
        if let Some(pattern) = build_pattern(
            PatternType::RushHour,
            &rush,
            vec![
                TriggerCondition::HourRange { start: 7, end: 10 },
                TriggerCondition::HourRange { start: 17, end: 20 },
                TriggerCondition::WeekdaysOnly,
            ],
            Duration::hours(4),
        ) {
            patterns.push(pattern);
        }

        let events: Vec<&Observation> = data.iter().filter(|o| !o.events().is_empty()).collect();
        if let Some(pattern) = build_pattern(
            PatternType::EventBased,
            &events,
            vec![TriggerCondition::EventReported],
            Duration::hours(2),
        ) {
            patterns.push(pattern);
        }

        let weather: Vec<&Observation> = data
            .iter()
            .filter(|o| o.weather().map(|w| w.is_adverse()).unwrap_or(false))
            .collect();
        if let Some(pattern) = build_pattern(
            PatternType::WeatherRelated,
            &weather,
            vec![
                TriggerCondition::HeavyRain { threshold_mm: 5.0 },
                TriggerCondition::LowVisibility { threshold_km: 5.0 },
            ],
            Duration::hours(3),
        ) {
            patterns.push(pattern);
        }

        let congested_months = congested_months(data);
        let seasonal: Vec<&Observation> = data
            .iter()
            .filter(|o| congested_months.contains(&o.month()))
            .collect();
        if let Some(pattern) = build_pattern(
            PatternType::Seasonal,
            &seasonal,
            vec![TriggerCondition::Months(congested_months)],
            Duration::days(30),
        ) {
            patterns.push(pattern);
        }

        debug!(detected = patterns.len(), "congestion patterns detected");
        self.patterns = patterns;
        &self.patterns
    }

    /// Whether a detected pattern is in effect at `time`.
    ///
    /// Rush-hour patterns apply on weekdays inside one of their hour ranges;
    /// seasonal patterns apply from November to February. Event and weather
    /// patterns depend on live signals and never apply here.
    pub fn pattern_applies(pattern: &CongestionPattern, time: &DateTime<Utc>) -> bool {
        match pattern.pattern_type {
            PatternType::RushHour => {
                let hour = time.hour() as usize;
                let mut in_window = false;
                let mut weekday_ok = true;
                for condition in &pattern.trigger_conditions {
                    match condition {
                        TriggerCondition::HourRange { start, end } => {
                            in_window |= (*start..=*end).contains(&hour);
                        }
                        TriggerCondition::WeekdaysOnly => weekday_ok &= !is_weekend(time),
                        _ => {}
                    }
                }
                in_window && weekday_ok
            }
            PatternType::Seasonal => WINTER_MONTHS.contains(&(time.month0() as usize)),
            PatternType::EventBased | PatternType::WeatherRelated => false,
        }
    }

    /// Congestion estimate for `time` from the pattern tables.
    ///
    /// The sparse-table confidence penalty counts only entries backed by
    /// observations (see [`PatternAnalyzer::observed_entries`]). Interpolated
    /// hourly gaps do not count, otherwise the 24-entry hourly table would
    /// always hide a sparse history.
    pub fn estimate(&self, time: &DateTime<Utc>) -> PatternEstimate {
        let hour = time.hour() as usize;
        let day = weekday_index(time);
        let month = time.month0() as usize;

        let (mut congestion, mut speed, hour_std) = match self.hourly.get(hour) {
            Some(p) => (p.average_congestion, p.typical_speed, p.std_dev),
            None => (
                DEFAULT_CONGESTION,
                speed_for_congestion(DEFAULT_CONGESTION),
                0.5,
            ),
        };

        if let Some(day_pattern) = self.daily.get(day) {
            congestion *= day_pattern.weekend_factor;
            if day_pattern.is_peak(hour) {
                congestion *= 1.3;
                speed *= 0.7;
            } else if day_pattern.is_off_peak(hour) {
                congestion *= 0.8;
                speed *= 1.2;
            }
        }

        if let Some(season) = self.seasonal.get(month) {
            congestion *= season.combined_factor();
        }

        for pattern in &self.patterns {
            if Self::pattern_applies(pattern, time) {
                congestion *= 1.0 + pattern.severity_level * 0.3;
            }
        }

        let mut confidence: f64 = 0.7;
        if hour_std < 0.5 {
            confidence += 0.1;
        }
        if is_weekend(time) {
            confidence -= 0.1;
        } else {
            confidence += 0.1;
        }
        if self.observed_entries() < 10 {
            confidence -= 0.2;
        }

        PatternEstimate {
            congestion: clamp_congestion(congestion),
            speed: if speed.is_finite() {
                speed.clamp(5.0, 60.0)
            } else {
                speed_for_congestion(DEFAULT_CONGESTION)
            },
            confidence: confidence.clamp(0.1, 1.0),
        }
    }

    /// Pattern-based prediction for an area at `target`.
    ///
    /// # Errors
    /// `NotTrained` before [`PatternAnalyzer::analyze_all`] has succeeded.
    pub fn predict_based_on_patterns(
        &self,
        area: &Area,
        target: DateTime<Utc>,
    ) -> Result<Prediction> {
        if !self.is_trained() {
            return Err(ForecastError::NotTrained);
        }
        let estimate = self.estimate(&target);
        debug!(area = %area, congestion = estimate.congestion, "pattern estimate");

        Ok(Prediction::new(
            target,
            CongestionLevel::from_value(estimate.congestion),
            estimate.speed,
            estimate.confidence,
        ))
    }

    /// Hours, weekdays and months whose entries are backed by observations.
    pub fn observed_entries(&self) -> usize {
        self.hourly.iter().filter(|p| p.sample_count > 0).count()
            + self.daily.iter().filter(|p| p.sample_count > 0).count()
            + self.seasonal.iter().filter(|p| p.sample_count > 0).count()
    }

    pub fn is_trained(&self) -> bool {
        self.accuracy.is_some()
    }

    /// In-sample accuracy of the pattern estimates.
    pub fn accuracy(&self) -> Result<ModelAccuracy> {
        self.accuracy.ok_or(ForecastError::NotTrained)
    }

    pub fn hourly(&self) -> &[HourlyPattern] {
        &self.hourly
    }

    pub fn day_of_week(&self) -> &[DayOfWeekPattern] {
        &self.daily
    }

    pub fn seasonal(&self) -> &[SeasonalPattern] {
        &self.seasonal
    }

    pub fn congestion_patterns(&self) -> &[CongestionPattern] {
        &self.patterns
    }
}

fn build_pattern(
    pattern_type: PatternType,
    subset: &[&Observation],
    trigger_conditions: Vec<TriggerCondition>,
    average_duration: Duration,
) -> Option<CongestionPattern> {
    if subset.is_empty() {
        return None;
    }
    let levels: Vec<f64> = subset.iter().map(|o| o.congestion_level()).collect();
    let affected_areas: BTreeSet<String> = subset.iter().map(|o| o.area().id.clone()).collect();

    Some(CongestionPattern {
        pattern_type,
        trigger_conditions,
        average_duration,
        severity_level: mean(&levels).min(3.0),
        affected_areas: affected_areas.into_iter().collect(),
        mitigation_strategies: pattern_type.mitigation_strategies(),
    })
}

/// Months whose mean congestion exceeds the mean of monthly means by more
/// than the seasonal margin.
fn congested_months(data: &[Observation]) -> Vec<usize> {
    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); 12];
    for obs in data {
        buckets[obs.month()].push(obs.congestion_level());
    }
    let monthly: Vec<(usize, f64)> = buckets
        .iter()
        .enumerate()
        .filter(|(_, values)| !values.is_empty())
        .map(|(month, values)| (month, mean(values)))
        .collect();
    if monthly.is_empty() {
        return Vec::new();
    }

    let overall = monthly.iter().map(|(_, m)| m).sum::<f64>() / monthly.len() as f64;
    monthly
        .into_iter()
        .filter(|(_, m)| *m > overall + SEASONAL_MARGIN)
        .map(|(month, _)| month)
        .collect()
}
