//! Return and covariance transforms shared by both allocation engines.

pub mod transform;

pub use transform::{
    arithmetic_returns, covariance_biased, log_returns, mean_returns, simple_returns,
    variance_population,
};
