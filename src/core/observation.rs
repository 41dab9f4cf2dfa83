//! Historical traffic observations and their optional attachments.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;

/// Land-use classification of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoneType {
    Residential,
    Commercial,
    Industrial,
    Highway,
    #[default]
    Mixed,
}

impl ZoneType {
    /// Numeric code used in feature vectors (0..=4).
    pub fn code(&self) -> u8 {
        match self {
            ZoneType::Residential => 0,
            ZoneType::Commercial => 1,
            ZoneType::Industrial => 2,
            ZoneType::Highway => 3,
            ZoneType::Mixed => 4,
        }
    }
}

/// A geographic area forecasts are made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Area {
    /// Stable identifier of the area.
    pub id: String,
    /// Zone classification.
    pub zone_type: ZoneType,
}

impl Area {
    pub fn new(id: impl Into<String>, zone_type: ZoneType) -> Self {
        Self {
            id: id.into(),
            zone_type,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Weather attached to an observation by an external weather provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherConditions {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Rainfall in mm/h.
    pub rainfall: f64,
    /// Visibility in km.
    pub visibility: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
}

impl WeatherConditions {
    pub fn new(temperature: f64, rainfall: f64, visibility: f64, wind_speed: f64) -> Self {
        Self {
            temperature,
            rainfall,
            visibility,
            wind_speed,
        }
    }

    /// Clear, dry weather with 10 km visibility.
    pub fn clear() -> Self {
        Self::new(20.0, 0.0, 10.0, 5.0)
    }

    /// Driving-conditions score in [0, 1]; 1 is ideal.
    pub fn score(&self) -> f64 {
        let rain_penalty = (self.rainfall / 20.0).clamp(0.0, 1.0);
        let visibility_penalty = ((10.0 - self.visibility) / 10.0).clamp(0.0, 1.0);
        (1.0 - 0.5 * rain_penalty - 0.5 * visibility_penalty).clamp(0.0, 1.0)
    }

    /// Heavy rain or poor visibility.
    pub fn is_adverse(&self) -> bool {
        self.rainfall > 5.0 || self.visibility < 5.0
    }
}

/// An event (accident, concert, roadworks, ...) affecting traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFactor {
    /// Free-form event category, e.g. `"accident"`.
    pub event_type: String,
    /// Expected traffic impact in [0, 1].
    pub impact: f64,
    pub description: String,
}

impl EventFactor {
    pub fn new(event_type: impl Into<String>, impact: f64, description: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            impact,
            description: description.into(),
        }
    }
}

/// A single recorded traffic measurement for an area.
///
/// Construct through [`Observation::new`], which validates the ranges of the
/// measured quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    timestamp: DateTime<Utc>,
    area: Area,
    congestion_level: f64,
    average_speed: f64,
    travel_time_multiplier: f64,
    weather: Option<WeatherConditions>,
    events: Vec<EventFactor>,
}

impl Observation {
    /// Create an observation.
    ///
    /// # Errors
    /// `InvalidParameter` if congestion is outside [0, 3], speed is not
    /// positive, or the travel-time multiplier is below 1.
    pub fn new(
        timestamp: DateTime<Utc>,
        area: Area,
        congestion_level: f64,
        average_speed: f64,
        travel_time_multiplier: f64,
    ) -> Result<Self> {
        if !(0.0..=3.0).contains(&congestion_level) {
            return Err(ForecastError::InvalidParameter(format!(
                "congestion level {} outside [0, 3]",
                congestion_level
            )));
        }
        if !average_speed.is_finite() || average_speed <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "average speed must be positive, got {}",
                average_speed
            )));
        }
        if !travel_time_multiplier.is_finite() || travel_time_multiplier < 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "travel time multiplier must be >= 1, got {}",
                travel_time_multiplier
            )));
        }

        Ok(Self {
            timestamp,
            area,
            congestion_level,
            average_speed,
            travel_time_multiplier,
            weather: None,
            events: Vec::new(),
        })
    }

    pub fn with_weather(mut self, weather: WeatherConditions) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_events(mut self, events: Vec<EventFactor>) -> Self {
        self.events = events;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    pub fn congestion_level(&self) -> f64 {
        self.congestion_level
    }

    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }

    pub fn travel_time_multiplier(&self) -> f64 {
        self.travel_time_multiplier
    }

    pub fn weather(&self) -> Option<&WeatherConditions> {
        self.weather.as_ref()
    }

    pub fn events(&self) -> &[EventFactor] {
        &self.events
    }

    /// Hour of day, 0..=23.
    pub fn hour(&self) -> usize {
        self.timestamp.hour() as usize
    }

    /// Day of week, 0 = Sunday ..= 6 = Saturday.
    pub fn weekday(&self) -> usize {
        weekday_index(&self.timestamp)
    }

    /// Month, 0 = January ..= 11 = December.
    pub fn month(&self) -> usize {
        self.timestamp.month0() as usize
    }
}

/// Day of week with Sunday as 0.
pub fn weekday_index(time: &DateTime<Utc>) -> usize {
    time.weekday().num_days_from_sunday() as usize
}

/// Saturday or Sunday.
pub fn is_weekend(time: &DateTime<Utc>) -> bool {
    matches!(weekday_index(time), 0 | 6)
}

/// Inside the morning (07–10h) or evening (17–20h) rush windows, inclusive.
pub fn is_rush_hour(hour: usize) -> bool {
    (7..=10).contains(&hour) || (17..=20).contains(&hour)
}
