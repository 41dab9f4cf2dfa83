//! # traffic-forecast
//!
//! Road-traffic congestion forecasting.
//!
//! Blends three independently trained models into one calibrated
//! prediction per area and hour: a grid-searched heuristic ARIMA over the
//! congestion series, a linear/polynomial ridge regression over calendar and
//! condition features, and descriptive hourly, weekly and seasonal pattern
//! tables with recurring-congestion detection.
//!
//! ```no_run
//! use traffic_forecast::prelude::*;
//! use chrono::Utc;
//!
//! # fn history() -> Vec<Observation> { Vec::new() }
//! let mut forecaster = EnsembleForecaster::new();
//! forecaster.initialize(&history())?;
//!
//! let area = Area::new("downtown", ZoneType::Commercial);
//! let window = TimeWindow::hours_from(Utc::now(), 6)?;
//! let forecast = forecaster.forecast(&area, window)?;
//! println!("{} steps, confidence {:.2}", forecast.horizon(), forecast.overall_confidence);
//! # Ok::<(), ForecastError>(())
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{
        Area, CongestionLevel, EventFactor, Forecast, ForecastModel, Observation, Prediction,
        PredictionResult, TimeWindow, WeatherConditions, ZoneType,
    };
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{CongestionModel, EnsembleConfig, EnsembleForecaster};
    pub use crate::utils::ModelAccuracy;
}
