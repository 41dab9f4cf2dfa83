//! Utility functions shared by the forecasting models.

pub mod linalg;
pub mod metrics;
pub mod speed;
pub mod stats;

pub use linalg::{mat_mul, mat_vec, solve, solve_normal_equation, transpose, Matrix};
pub use metrics::{calculate_accuracy, ModelAccuracy};
pub use speed::{classify, clamp_congestion, speed_for_congestion};
