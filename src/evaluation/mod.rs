//! Realized-performance scoring shared by both allocation engines.

pub mod sharpe;

pub use sharpe::{PerformanceEvaluator, TRADING_DAYS_PER_YEAR};
