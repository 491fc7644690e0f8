//! Error types for Optifolio.

use thiserror::Error;

/// Result type alias for Optifolio operations.
pub type Result<T> = std::result::Result<T, OptifolioError>;

/// Error types for the allocation engines.
#[derive(Error, Debug)]
pub enum OptifolioError {
    /// A price entry that log/simple returns cannot be computed from.
    #[error("Non-positive price {value} at date {date}, ticker {ticker}")]
    NonPositivePrice { date: usize, ticker: usize, value: f64 },

    /// Data length mismatch between arrays.
    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for calculation.
    #[error("Insufficient data: need at least {required} elements, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Invalid parameter value.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The Markowitz target return is unreachable: every asset carries the
    /// same mean return and that mean sits below the implied target.
    #[error("Markowitz target return {target} is infeasible: all assets share mean {common_mean}")]
    InfeasibleTarget { common_mean: f64, target: f64 },

    /// A zero-variance return series where a Sharpe ratio was requested.
    #[error("Degenerate volatility (zero return std) in {context}")]
    DegenerateVolatility { context: String },
}

impl OptifolioError {
    /// Create a length mismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData { required, available }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter { message: message.into() }
    }

    /// Create a degenerate volatility error.
    pub fn degenerate_volatility(context: impl Into<String>) -> Self {
        Self::DegenerateVolatility { context: context.into() }
    }
}
