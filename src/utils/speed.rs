//! Mapping from the continuous congestion scale to categories and speeds.

use crate::core::CongestionLevel;

/// Lower bound of the congestion scale.
pub const MIN_CONGESTION: f64 = 0.0;

/// Upper bound of the congestion scale.
pub const MAX_CONGESTION: f64 = 3.0;

/// Typical speed in km/h at congestion 0, 1, 2 and 3.
const SPEED_ANCHORS: [(f64, f64); 4] = [(0.0, 45.0), (1.0, 25.0), (2.0, 15.0), (3.0, 8.0)];

/// Clamp a raw model output onto the congestion scale.
///
/// Non-finite values map to the middle of the scale.
pub fn clamp_congestion(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_CONGESTION, MAX_CONGESTION)
    } else {
        (MIN_CONGESTION + MAX_CONGESTION) / 2.0
    }
}

/// Estimate the average speed (km/h) for a congestion value.
///
/// Piecewise-linear interpolation between the anchor speeds; values outside
/// [0, 3] are clamped first, so the result always lies in [8, 45].
pub fn speed_for_congestion(value: f64) -> f64 {
    let value = clamp_congestion(value);
    for pair in SPEED_ANCHORS.windows(2) {
        let (x0, s0) = pair[0];
        let (x1, s1) = pair[1];
        if value <= x1 {
            return s0 + (s1 - s0) * (value - x0) / (x1 - x0);
        }
    }
    SPEED_ANCHORS[SPEED_ANCHORS.len() - 1].1
}

/// Clamp a raw value to the congestion scale and derive category and speed.
pub fn classify(value: f64) -> (CongestionLevel, f64) {
    let value = clamp_congestion(value);
    (CongestionLevel::from_value(value), speed_for_congestion(value))
}
