//! Monte Carlo weight search over simulated GBM price paths.
//!
//! Three-stage pipeline: simulate future price paths per ticker, sample
//! candidate weight vectors, then score every candidate by its averaged
//! simulated Sharpe ratio and keep the best one.

pub mod engine;
pub mod paths;
pub mod rng;
pub mod weights;

pub use engine::{select_optimal_weights, MonteCarloConfig, MonteCarloEngine, MonteCarloSolution};
pub use paths::{gbm_step, simulate_price_paths};
pub use rng::SimRng;
pub use weights::{broadcast_weights, sample_weights};
