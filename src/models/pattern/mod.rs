//! Descriptive congestion patterns.
//!
//! Builds hourly, day-of-week and monthly tables from history, detects
//! recurring congestion (rush hours, events, adverse weather, congested
//! months) and turns them into pattern-based predictions.

mod analyzer;
mod tables;

pub use analyzer::{PatternAnalyzer, PatternEstimate};
pub use tables::{
    CongestionPattern, DayOfWeekPattern, HourlyPattern, PatternType, SeasonalPattern,
    TriggerCondition,
};
