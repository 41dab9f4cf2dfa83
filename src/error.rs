//! Error types for the traffic-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during training and forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Fewer samples than the operation requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Time-series model queried before training.
    #[error("model must be trained before prediction")]
    NotTrained,

    /// Neither regression variant has been trained.
    #[error("no trained regression model available")]
    NoTrainedModel,

    /// Ensemble used before a successful `initialize`.
    #[error("ensemble has not been initialized")]
    NotInitialized,

    /// Zero (or numerically zero) pivot while solving a linear system.
    #[error("singular matrix: zero pivot in column {pivot}")]
    SingularMatrix { pivot: usize },

    /// Grid-search candidate rejected before scoring.
    #[error("invalid ARIMA({p},{d},{q}) candidate: {reason}")]
    InvalidParameterCombination {
        p: usize,
        d: usize,
        q: usize,
        reason: String,
    },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}
