//! Feature extraction for the regression model.
//!
//! Converts an (area, time) pair plus optional live conditions into the
//! ten-feature vector the regression model is fitted on.

use crate::core::observation::{is_weekend, weekday_index};
use crate::core::{Area, EventFactor, Observation, WeatherConditions, ZoneType};
use crate::utils::speed::MAX_CONGESTION;
use crate::utils::stats::mean;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::collections::{HashMap, HashSet};

/// Number of base features.
pub const FEATURE_COUNT: usize = 10;

/// Congestion assumed when nothing is known about an area.
pub const DEFAULT_CONGESTION: f64 = 1.5;

/// Number of trailing readings used for the recent trend.
const TREND_WINDOW: usize = 6;

/// Features describing a single prediction target.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Hour of day, 0..=23.
    pub hour: usize,
    /// Day of week, 0 = Sunday.
    pub day_of_week: usize,
    /// Month, 0 = January.
    pub month: usize,
    pub is_weekend: bool,
    pub is_holiday: bool,
    /// Driving-conditions score in [0, 1]; 1 is ideal.
    pub weather_score: f64,
    /// Strongest expected event impact in [0, 1].
    pub event_impact: f64,
    /// Typical congestion for this area and hour, on the [0, 3] scale.
    pub historical_average: f64,
    /// Recent direction of congestion in [-1, 1].
    pub recent_trend: f64,
    pub zone_type: ZoneType,
}

impl FeatureVector {
    /// Calendar-only features with neutral conditions and defaults.
    pub fn for_time(time: &DateTime<Utc>, zone_type: ZoneType) -> Self {
        Self {
            hour: time.hour() as usize,
            day_of_week: weekday_index(time),
            month: time.month0() as usize,
            is_weekend: is_weekend(time),
            is_holiday: false,
            weather_score: 1.0,
            event_impact: 0.0,
            historical_average: DEFAULT_CONGESTION,
            recent_trend: 0.0,
            zone_type,
        }
    }

    /// Features scaled to roughly [0, 1], in declaration order.
    pub fn normalized(&self) -> [f64; FEATURE_COUNT] {
        [
            self.hour as f64 / 23.0,
            self.day_of_week as f64 / 6.0,
            self.month as f64 / 11.0,
            flag(self.is_weekend),
            flag(self.is_holiday),
            self.weather_score.clamp(0.0, 1.0),
            self.event_impact.clamp(0.0, 1.0),
            (self.historical_average / MAX_CONGESTION).clamp(0.0, 1.0),
            ((self.recent_trend + 1.0) / 2.0).clamp(0.0, 1.0),
            self.zone_type.code() as f64 / 4.0,
        ]
    }

    pub fn is_morning_rush(&self) -> bool {
        (7..=10).contains(&self.hour)
    }

    pub fn is_evening_rush(&self) -> bool {
        (17..=20).contains(&self.hour)
    }

    /// Late evening through early morning (22–05h).
    pub fn is_night(&self) -> bool {
        self.hour >= 22 || self.hour <= 5
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Weather score for optional weather data; missing weather counts as ideal.
pub fn weather_score(weather: Option<&WeatherConditions>) -> f64 {
    weather.map(|w| w.score()).unwrap_or(1.0)
}

/// Strongest event impact, clamped to [0, 1].
pub fn event_impact(events: &[EventFactor]) -> f64 {
    events
        .iter()
        .map(|e| e.impact)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0)
}

/// Builds feature vectors from a fixed history of observations.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    /// Per-area (timestamp, congestion) readings sorted by time.
    by_area: HashMap<String, Vec<(DateTime<Utc>, f64)>>,
    /// Mean congestion per hour over all areas.
    hourly_means: [Option<f64>; 24],
    holidays: HashSet<NaiveDate>,
}

impl FeatureExtractor {
    /// Index a history of observations.
    pub fn new(history: &[Observation]) -> Self {
        let mut by_area: HashMap<String, Vec<(DateTime<Utc>, f64)>> = HashMap::new();
        let mut hourly: Vec<Vec<f64>> = vec![Vec::new(); 24];

        for obs in history {
            by_area
                .entry(obs.area().id.clone())
                .or_default()
                .push((obs.timestamp(), obs.congestion_level()));
            hourly[obs.hour()].push(obs.congestion_level());
        }
        for readings in by_area.values_mut() {
            readings.sort_by_key(|(ts, _)| *ts);
        }

        let mut hourly_means = [None; 24];
        for (slot, values) in hourly_means.iter_mut().zip(hourly.iter()) {
            if !values.is_empty() {
                *slot = Some(mean(values));
            }
        }

        Self {
            by_area,
            hourly_means,
            holidays: HashSet::new(),
        }
    }

    /// Use a holiday calendar for the is-holiday flag.
    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays = holidays.into_iter().collect();
        self
    }

    pub fn is_holiday(&self, time: &DateTime<Utc>) -> bool {
        self.holidays.contains(&time.date_naive())
    }

    /// Features for a target with no live weather or event information.
    pub fn features_at(&self, area: &Area, time: &DateTime<Utc>) -> FeatureVector {
        self.features_with_conditions(area, time, None, &[])
    }

    /// Features for a target with externally supplied live conditions.
    pub fn features_with_conditions(
        &self,
        area: &Area,
        time: &DateTime<Utc>,
        weather: Option<&WeatherConditions>,
        events: &[EventFactor],
    ) -> FeatureVector {
        let prior = self.prior_readings(&area.id, time);
        let hour = time.hour() as usize;

        FeatureVector {
            is_holiday: self.is_holiday(time),
            weather_score: weather_score(weather),
            event_impact: event_impact(events),
            historical_average: self.historical_average(prior, hour),
            recent_trend: recent_trend(prior),
            ..FeatureVector::for_time(time, area.zone_type)
        }
    }

    /// Features of a recorded observation, using only strictly earlier history.
    pub fn features_for_observation(&self, obs: &Observation) -> FeatureVector {
        self.features_with_conditions(obs.area(), &obs.timestamp(), obs.weather(), obs.events())
    }

    /// Congestion readings of an area strictly before `time`, oldest first.
    pub fn prior_readings(&self, area_id: &str, time: &DateTime<Utc>) -> &[(DateTime<Utc>, f64)] {
        match self.by_area.get(area_id) {
            Some(readings) => {
                let end = readings.partition_point(|(ts, _)| ts < time);
                &readings[..end]
            }
            None => &[],
        }
    }

    /// Up to `n` most recent congestion values of an area before `time`.
    pub fn recent_values(&self, area_id: &str, time: &DateTime<Utc>, n: usize) -> Vec<f64> {
        let prior = self.prior_readings(area_id, time);
        let start = prior.len().saturating_sub(n);
        prior[start..].iter().map(|(_, v)| *v).collect()
    }

    fn historical_average(&self, prior: &[(DateTime<Utc>, f64)], hour: usize) -> f64 {
        let same_hour: Vec<f64> = prior
            .iter()
            .filter(|(ts, _)| ts.hour() as usize == hour)
            .map(|(_, v)| *v)
            .collect();
        if !same_hour.is_empty() {
            return mean(&same_hour);
        }
        if !prior.is_empty() {
            let all: Vec<f64> = prior.iter().map(|(_, v)| *v).collect();
            return mean(&all);
        }
        self.hourly_means[hour].unwrap_or(DEFAULT_CONGESTION)
    }
}

fn recent_trend(prior: &[(DateTime<Utc>, f64)]) -> f64 {
    let start = prior.len().saturating_sub(TREND_WINDOW);
    let window = &prior[start..];
    match (window.first(), window.last()) {
        (Some((_, first)), Some((_, last))) if window.len() >= 2 => {
            ((last - first) / MAX_CONGESTION).clamp(-1.0, 1.0)
        }
        _ => 0.0,
    }
}
