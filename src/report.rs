//! Side-by-side optimization report for the two allocation strategies.
//!
//! This is the surface the reporting layer consumes: both engines run
//! against the same price history and both weight vectors are scored with
//! the same evaluator. Wall-clock time and peak memory are a caller
//! concern, measured around [`optimize`] if wanted.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{validate_weights, PriceMatrix};
use crate::evaluation::PerformanceEvaluator;
use crate::markowitz::MarkowitzSolver;
use crate::monte_carlo::{MonteCarloConfig, MonteCarloEngine};

/// Combined configuration for a full optimization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// Markowitz risk-aversion multiplier.
    pub lambda: f64,
    /// Annual risk-free rate used by the realized-Sharpe evaluator.
    pub risk_free_rate: f64,
    /// Monte Carlo pipeline parameters.
    pub monte_carlo: MonteCarloConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            risk_free_rate: 0.0,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

/// One strategy's weights and realized score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutcome {
    /// Optimal weights, one per ticker.
    pub weights: Vec<f64>,
    /// Annualized Sharpe ratio over the realized history.
    pub sharpe: f64,
}

/// Report comparing both strategies on the same price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Ticker labels, in weight order.
    pub tickers: Vec<String>,
    /// Closed-form Markowitz outcome.
    pub markowitz: StrategyOutcome,
    /// Monte Carlo search outcome.
    pub monte_carlo: StrategyOutcome,
    /// Set when the Markowitz covariance matrix was singular and the solve
    /// used the pseudo-inverse fallback.
    pub used_pseudo_inverse: bool,
}

/// Run both engines and score both outputs.
///
/// Data-dependent failures (infeasible Markowitz target, degenerate
/// volatility) propagate as typed errors for the reporting layer to display
/// verbatim; they are not retried here.
pub fn optimize(prices: &PriceMatrix, config: &OptimizeConfig) -> Result<OptimizationReport> {
    let markowitz = MarkowitzSolver::new(config.lambda).solve(prices)?;
    let monte_carlo = MonteCarloEngine::new(config.monte_carlo.clone()).run(prices)?;

    validate_weights(&markowitz.weights, prices.num_tickers())?;
    validate_weights(&monte_carlo.weights, prices.num_tickers())?;

    let evaluator = PerformanceEvaluator::new(config.risk_free_rate);
    let markowitz_sharpe = evaluator.annualized_sharpe(&markowitz.weights, prices)?;
    let monte_carlo_sharpe = evaluator.annualized_sharpe(&monte_carlo.weights, prices)?;

    Ok(OptimizationReport {
        tickers: prices.tickers().to_vec(),
        markowitz: StrategyOutcome {
            weights: markowitz.weights.to_vec(),
            sharpe: markowitz_sharpe,
        },
        monte_carlo: StrategyOutcome {
            weights: monte_carlo.weights.to_vec(),
            sharpe: monte_carlo_sharpe,
        },
        used_pseudo_inverse: markowitz.used_pseudo_inverse,
    })
}
