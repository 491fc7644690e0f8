//! Stage c and orchestration: score candidates and keep the best.

use ndarray::{Array1, Array2, Array3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::{OptifolioError, Result};
use crate::core::types::PriceMatrix;
use crate::monte_carlo::paths::simulate_price_paths;
use crate::monte_carlo::rng::SimRng;
use crate::monte_carlo::weights::sample_weights;
use crate::returns::log_returns;

/// Configuration for the Monte Carlo weight search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of future dates to simulate per path.
    pub num_sim_dates: usize,
    /// Number of independent price-path replicates.
    pub num_price_sims: usize,
    /// Number of candidate weight vectors to sample.
    pub num_weight_sims: usize,
    /// Per-period risk-free rate subtracted in the simulated Sharpe.
    pub risk_free_rate: f64,
    /// RNG seed; a fixed seed reproduces the run bit-for-bit.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_sim_dates: 100,
            num_price_sims: 100,
            num_weight_sims: 100,
            risk_free_rate: 0.03,
            seed: 42,
        }
    }
}

/// Result of a Monte Carlo weight search.
#[derive(Debug, Clone)]
pub struct MonteCarloSolution {
    /// The winning candidate's weights, one per ticker, summing to 1.
    pub weights: Array1<f64>,
    /// The winning candidate's Sharpe ratio averaged over price simulations.
    pub avg_sharpe: f64,
    /// Index of the winning candidate among the sampled weight vectors.
    pub candidate_index: usize,
    /// How many candidates were dropped because no price simulation gave
    /// them a finite Sharpe ratio.
    pub excluded_candidates: usize,
}

/// Monte Carlo search engine.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloEngine {
    /// Simulation configuration.
    pub config: MonteCarloConfig,
}

impl MonteCarloEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline, seeding the generator from the configuration.
    pub fn run(&self, prices: &PriceMatrix) -> Result<MonteCarloSolution> {
        let mut rng = SimRng::new(self.config.seed);
        self.run_with_rng(prices, &mut rng)
    }

    /// Run the full pipeline with an injected generator.
    ///
    /// All random draws happen in this thread, in a fixed order, before the
    /// parallel scoring stage; two calls with identical inputs and generator
    /// state produce bit-identical solutions.
    pub fn run_with_rng(&self, prices: &PriceMatrix, rng: &mut SimRng) -> Result<MonteCarloSolution> {
        self.validate()?;

        let realized = log_returns(prices.data())?;
        let paths = simulate_price_paths(
            prices.last_prices(),
            &realized,
            self.config.num_sim_dates,
            self.config.num_price_sims,
            rng,
        );
        let candidates = sample_weights(self.config.num_weight_sims, prices.num_tickers(), rng);

        select_optimal_weights(&paths, &candidates, self.config.risk_free_rate)
    }

    fn validate(&self) -> Result<()> {
        // At least 2 simulated dates are needed to form one simulated return.
        if self.config.num_sim_dates < 2 {
            return Err(OptifolioError::insufficient_data(2, self.config.num_sim_dates));
        }
        if self.config.num_price_sims == 0 || self.config.num_weight_sims == 0 {
            return Err(OptifolioError::invalid_parameter(
                "num_price_sims and num_weight_sims must be at least 1",
            ));
        }
        if !self.config.risk_free_rate.is_finite() {
            return Err(OptifolioError::invalid_parameter(format!(
                "risk_free_rate must be finite, got {}",
                self.config.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Score every candidate against every simulated path and return the best.
///
/// Portfolio returns are formed with one flattened matrix product
/// ((sim dates - 1) * price sims, tickers) x (tickers, candidates) rather
/// than a per-ticker loop; per-candidate statistics then run in parallel
/// over rayon.
///
/// Non-finite policy: a (candidate, price simulation) cell with zero return
/// volatility would yield a non-finite Sharpe, so it is excluded from that
/// candidate's average. A candidate with no finite cell is excluded from the
/// argmax, and if every candidate is excluded the search fails with
/// `DegenerateVolatility` instead of silently ranking non-finite scores.
pub fn select_optimal_weights(
    paths: &Array3<f64>,
    candidates: &Array2<f64>,
    risk_free_rate: f64,
) -> Result<MonteCarloSolution> {
    let (num_sim_dates, num_price_sims, num_tickers) = paths.dim();
    if num_sim_dates < 2 {
        return Err(OptifolioError::insufficient_data(2, num_sim_dates));
    }
    if candidates.ncols() != num_tickers {
        return Err(OptifolioError::length_mismatch(num_tickers, candidates.ncols()));
    }
    let num_candidates = candidates.nrows();
    let num_returns = num_sim_dates - 1;

    // Log returns across the simulated-date axis, flattened to
    // (returns * price sims, tickers) with row index t * num_price_sims + s.
    let mut sim_returns = Array2::zeros((num_returns * num_price_sims, num_tickers));
    for t in 1..num_sim_dates {
        for s in 0..num_price_sims {
            let row = (t - 1) * num_price_sims + s;
            for k in 0..num_tickers {
                sim_returns[[row, k]] = (paths[[t, s, k]] / paths[[t - 1, s, k]]).ln();
            }
        }
    }

    // (returns * price sims, candidates): every candidate's portfolio return
    // series against every path, in one product.
    let portfolio = sim_returns.dot(&candidates.t());

    let scores: Vec<Option<f64>> = (0..num_candidates)
        .into_par_iter()
        .map(|w| {
            let mut finite_sum = 0.0;
            let mut finite_count = 0usize;
            for s in 0..num_price_sims {
                let mut mean = 0.0;
                for t in 0..num_returns {
                    mean += portfolio[[t * num_price_sims + s, w]];
                }
                mean /= num_returns as f64;

                let mut var = 0.0;
                for t in 0..num_returns {
                    var += (portfolio[[t * num_price_sims + s, w]] - mean).powi(2);
                }
                let std = (var / num_returns as f64).sqrt();

                if std > 0.0 {
                    finite_sum += (mean - risk_free_rate) / std;
                    finite_count += 1;
                }
            }
            (finite_count > 0).then(|| finite_sum / finite_count as f64)
        })
        .collect();

    let excluded_candidates = scores.iter().filter(|s| s.is_none()).count();

    let mut best: Option<(usize, f64)> = None;
    for (w, score) in scores.iter().enumerate() {
        if let Some(score) = *score {
            match best {
                Some((_, current)) if score <= current => {}
                _ => best = Some((w, score)),
            }
        }
    }

    let (candidate_index, avg_sharpe) = best.ok_or_else(|| {
        OptifolioError::degenerate_volatility("Monte Carlo weight selection")
    })?;

    Ok(MonteCarloSolution {
        weights: candidates.row(candidate_index).to_owned(),
        avg_sharpe,
        candidate_index,
        excluded_candidates,
    })
}
