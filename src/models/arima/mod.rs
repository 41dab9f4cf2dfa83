//! Heuristic ARIMA (Autoregressive Integrated Moving Average) time-series model.
//!
//! This module provides:
//! - Differencing of a congestion series
//! - Single ARIMA(p, d, q) candidates with damped-autocorrelation coefficients
//! - A grid-searched, AIC-selected time-series model

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{ArimaConfig, TimeSeriesModel};
pub use diff::difference;
pub use model::{ArimaFit, ArimaOrder, Heuristics};
