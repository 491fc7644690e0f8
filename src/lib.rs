//! Optifolio - portfolio allocation engine.
//!
//! This crate computes portfolio allocation weights from historical close
//! prices using two independent strategies:
//! - Closed-form Markowitz mean-variance optimization
//! - Monte Carlo search over simulated GBM price paths
//!
//! Both strategies are scored with the same annualized Sharpe evaluator so
//! their outputs are directly comparable.

pub mod core;
pub mod evaluation;
pub mod markowitz;
pub mod monte_carlo;
pub mod report;
pub mod returns;

pub use crate::core::error::{OptifolioError, Result};
pub use crate::core::types::PriceMatrix;
pub use crate::evaluation::PerformanceEvaluator;
pub use crate::markowitz::{MarkowitzSolution, MarkowitzSolver};
pub use crate::monte_carlo::{MonteCarloConfig, MonteCarloEngine, MonteCarloSolution};
pub use crate::report::{optimize, OptimizationReport, OptimizeConfig, StrategyOutcome};
