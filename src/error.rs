//! Error types for the forecasting service

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("No market data available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Insufficient data: need at least {required} usable rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid model choice: {0}")]
    InvalidModel(String),

    #[error("Horizon must be between 1 and {max} periods, got {0}", max = crate::projection::MAX_HORIZON)]
    InvalidHorizon(i64),

    #[error("Chronological split left the {partition} partition empty ({rows} rows total)")]
    EmptyPartition { partition: &'static str, rows: usize },

    #[error("Invalid contribution frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid lookback: {0}")]
    InvalidLookback(String),

    #[error("Unknown feature: {0}")]
    InvalidFeature(String),

    #[error("Invalid time series: {0}")]
    InvalidSeries(String),

    #[error("Model {0} has not been fitted yet")]
    NotFitted(&'static str),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured error body returned to callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub message: String,
}

impl ForecastError {
    /// Stable identifier for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::DataUnavailable { .. } => "DataUnavailableError",
            ForecastError::InsufficientData { .. } => "InsufficientDataError",
            ForecastError::InvalidModel(_) => "InvalidModelError",
            ForecastError::InvalidHorizon(_) => "InvalidHorizonError",
            ForecastError::EmptyPartition { .. } => "EmptyPartitionError",
            ForecastError::InvalidFrequency(_) => "InvalidFrequencyError",
            ForecastError::InvalidInput(_) => "InvalidInputError",
            ForecastError::InvalidLookback(_) => "InvalidLookbackError",
            ForecastError::InvalidFeature(_) => "InvalidFeatureError",
            ForecastError::InvalidSeries(_) => "InvalidSeriesError",
            ForecastError::NotFitted(_) => "NotFittedError",
            ForecastError::DimensionMismatch { .. } => "DimensionMismatchError",
            ForecastError::Numerical(_) => "NumericalError",
            ForecastError::Http(_) => "UpstreamError",
            ForecastError::Config(_) => "ConfigError",
            ForecastError::Internal(_) => "InternalError",
        }
    }

    /// Whether the error was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InvalidModel(_)
                | ForecastError::InvalidHorizon(_)
                | ForecastError::InvalidFrequency(_)
                | ForecastError::InvalidFeature(_)
                | ForecastError::InvalidLookback(_)
                | ForecastError::InvalidInput(_)
                | ForecastError::DataUnavailable { .. }
                | ForecastError::InsufficientData { .. }
                | ForecastError::EmptyPartition { .. }
        )
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub(crate) fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        ForecastError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}
