//! Pattern tables produced by the analyzer.

use chrono::Duration;
use std::fmt;

/// Congestion statistics for one hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPattern {
    pub hour: usize,
    pub average_congestion: f64,
    /// Population standard deviation of congestion.
    pub std_dev: f64,
    /// Share of observations with congestion above 2.0.
    pub peak_probability: f64,
    /// Mean observed speed in km/h.
    pub typical_speed: f64,
    /// Number of observations behind the entry; 0 for interpolated hours.
    pub sample_count: usize,
}

/// Congestion statistics for one day of the week.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOfWeekPattern {
    /// 0 = Sunday ..= 6 = Saturday.
    pub day: usize,
    pub average_congestion: f64,
    /// Hours whose mean exceeds the day mean by more than 0.5.
    pub peak_hours: Vec<usize>,
    /// Hours whose mean is more than 0.5 below the day mean.
    pub off_peak_hours: Vec<usize>,
    pub weekend_factor: f64,
    pub sample_count: usize,
}

impl DayOfWeekPattern {
    pub fn is_peak(&self, hour: usize) -> bool {
        self.peak_hours.contains(&hour)
    }

    pub fn is_off_peak(&self, hour: usize) -> bool {
        self.off_peak_hours.contains(&hour)
    }
}

/// Congestion statistics and multipliers for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalPattern {
    /// 0 = January ..= 11 = December.
    pub month: usize,
    pub average_congestion: f64,
    pub weather_impact_factor: f64,
    pub holiday_impact_factor: f64,
    pub school_season_factor: f64,
    pub sample_count: usize,
}

impl SeasonalPattern {
    /// Product of the three monthly multipliers.
    pub fn combined_factor(&self) -> f64 {
        self.weather_impact_factor * self.holiday_impact_factor * self.school_season_factor
    }
}

/// Kind of recurring congestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternType {
    RushHour,
    EventBased,
    WeatherRelated,
    Seasonal,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::RushHour => "rush_hour",
            PatternType::EventBased => "event_based",
            PatternType::WeatherRelated => "weather_related",
            PatternType::Seasonal => "seasonal",
        }
    }

    /// Fixed advice attached to every detected pattern of this type.
    pub fn mitigation_strategies(&self) -> Vec<&'static str> {
        match self {
            PatternType::RushHour => vec![
                "Stagger departures outside peak windows",
                "Prefer arterial bypass routes",
                "Coordinate signal timing along corridors",
            ],
            PatternType::EventBased => vec![
                "Monitor event schedules and road closures",
                "Reroute around venue perimeters",
                "Add buffer time for deliveries near events",
            ],
            PatternType::WeatherRelated => vec![
                "Lower speed assumptions in rain or fog",
                "Add buffer time to estimated arrivals",
                "Avoid flood-prone underpasses",
            ],
            PatternType::Seasonal => vec![
                "Adjust fleet capacity for seasonal demand",
                "Plan deliveries around festival periods",
                "Review seasonal route restrictions",
            ],
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence that triggers a congestion pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerCondition {
    /// Hour of day within `start..=end`.
    HourRange { start: usize, end: usize },
    /// Monday to Friday.
    WeekdaysOnly,
    /// At least one event reported.
    EventReported,
    /// Rainfall above the threshold, in mm/h.
    HeavyRain { threshold_mm: f64 },
    /// Visibility below the threshold, in km.
    LowVisibility { threshold_km: f64 },
    /// Month (0-based) in the list.
    Months(Vec<usize>),
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerCondition::HourRange { start, end } => write!(f, "hour {}-{}", start, end),
            TriggerCondition::WeekdaysOnly => f.write_str("weekdays"),
            TriggerCondition::EventReported => f.write_str("event reported"),
            TriggerCondition::HeavyRain { threshold_mm } => {
                write!(f, "rainfall > {} mm", threshold_mm)
            }
            TriggerCondition::LowVisibility { threshold_km } => {
                write!(f, "visibility < {} km", threshold_km)
            }
            TriggerCondition::Months(months) => write!(f, "months {:?}", months),
        }
    }
}

/// A recurring congestion pattern detected in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct CongestionPattern {
    pub pattern_type: PatternType,
    pub trigger_conditions: Vec<TriggerCondition>,
    pub average_duration: Duration,
    /// Mean congestion of the triggering observations, at most 3.
    pub severity_level: f64,
    /// Identifiers of areas with triggering observations, sorted.
    pub affected_areas: Vec<String>,
    pub mitigation_strategies: Vec<&'static str>,
}
