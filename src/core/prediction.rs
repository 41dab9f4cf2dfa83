//! Point predictions and their explanatory attachments.

use crate::utils::metrics::ModelAccuracy;
use chrono::{DateTime, Utc};
use std::fmt;

/// Reporting category of the continuous congestion scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl CongestionLevel {
    /// Categorise a congestion value: ≤0.5 low, ≤1.5 moderate, ≤2.5 high,
    /// otherwise severe.
    pub fn from_value(value: f64) -> Self {
        if value <= 0.5 {
            CongestionLevel::Low
        } else if value <= 1.5 {
            CongestionLevel::Moderate
        } else if value <= 2.5 {
            CongestionLevel::High
        } else {
            CongestionLevel::Severe
        }
    }

    /// Representative numeric value of the category (0, 1, 2 or 3).
    pub fn as_value(&self) -> f64 {
        match self {
            CongestionLevel::Low => 0.0,
            CongestionLevel::Moderate => 1.0,
            CongestionLevel::High => 2.0,
            CongestionLevel::Severe => 3.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "low",
            CongestionLevel::Moderate => "moderate",
            CongestionLevel::High => "high",
            CongestionLevel::Severe => "severe",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A congestion prediction for one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub timestamp: DateTime<Utc>,
    pub congestion_level: CongestionLevel,
    /// Expected average speed in km/h.
    pub average_speed: f64,
    /// Reliability score in [0.1, 1.0].
    pub confidence: f64,
}

impl Prediction {
    pub fn new(
        timestamp: DateTime<Utc>,
        congestion_level: CongestionLevel,
        average_speed: f64,
        confidence: f64,
    ) -> Self {
        Self {
            timestamp,
            congestion_level,
            average_speed,
            confidence,
        }
    }
}

/// What an explanatory factor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorKind {
    MorningRush,
    EveningRush,
    Weekend,
    PoorWeather,
    Event,
    Holiday,
}

impl FactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::MorningRush => "morning_rush",
            FactorKind::EveningRush => "evening_rush",
            FactorKind::Weekend => "weekend",
            FactorKind::PoorWeather => "poor_weather",
            FactorKind::Event => "event",
            FactorKind::Holiday => "holiday",
        }
    }
}

/// A condition that contributed to a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionFactor {
    pub kind: FactorKind,
    /// Signed effect on congestion; negative values ease traffic.
    pub impact: f64,
    pub confidence: f64,
    pub description: &'static str,
}

impl PredictionFactor {
    /// The fixed impact/confidence/description triple for a factor kind.
    pub fn of(kind: FactorKind) -> Self {
        let (impact, confidence, description) = match kind {
            FactorKind::MorningRush => (0.8, 0.9, "Morning rush hour commuter traffic"),
            FactorKind::EveningRush => (0.9, 0.9, "Evening rush hour commuter traffic"),
            FactorKind::Weekend => (-0.3, 0.8, "Lighter weekend traffic"),
            FactorKind::PoorWeather => (0.6, 0.7, "Poor weather slows traffic"),
            FactorKind::Event => (0.7, 0.6, "Scheduled or reported event nearby"),
            FactorKind::Holiday => (-0.4, 0.7, "Public holiday traffic pattern"),
        };
        Self {
            kind,
            impact,
            confidence,
            description,
        }
    }
}

/// An ensemble prediction with accuracy report and explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: Prediction,
    pub accuracy: ModelAccuracy,
    pub factors: Vec<PredictionFactor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_boundaries() {
        assert_eq!(CongestionLevel::from_value(0.0), CongestionLevel::Low);
        assert_eq!(CongestionLevel::from_value(0.5), CongestionLevel::Low);
        assert_eq!(CongestionLevel::from_value(0.50001), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_value(1.5), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_value(1.50001), CongestionLevel::High);
        assert_eq!(CongestionLevel::from_value(2.5), CongestionLevel::High);
        assert_eq!(CongestionLevel::from_value(2.50001), CongestionLevel::Severe);
        assert_eq!(CongestionLevel::from_value(3.0), CongestionLevel::Severe);
    }

    #[test]
    fn category_value_round_trip() {
        for level in [
            CongestionLevel::Low,
            CongestionLevel::Moderate,
            CongestionLevel::High,
            CongestionLevel::Severe,
        ] {
            assert_eq!(CongestionLevel::from_value(level.as_value()), level);
        }
    }

    #[test]
    fn category_display() {
        assert_eq!(CongestionLevel::Severe.to_string(), "severe");
        assert_eq!(CongestionLevel::Low.as_str(), "low");
        assert!(CongestionLevel::Low < CongestionLevel::Severe);
    }

    #[test]
    fn factor_triples_are_fixed() {
        let f = PredictionFactor::of(FactorKind::Weekend);
        assert!(f.impact < 0.0);
        assert_eq!(f.kind.as_str(), "weekend");
        let f = PredictionFactor::of(FactorKind::EveningRush);
        assert_eq!(f.impact, 0.9);
        assert_eq!(f.confidence, 0.9);
    }
}
