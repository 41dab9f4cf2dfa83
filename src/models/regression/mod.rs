//! Feature-based regression models.
//!
//! Linear least squares via the normal equation, and a ridge-regularised
//! polynomial variant over expanded features.

mod model;
mod polynomial;

pub use model::{RegressionConfig, RegressionModel, RegressionSample, RegressionState};
pub use polynomial::{expand_polynomial, expanded_len};
