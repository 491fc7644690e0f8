//! Stage a: geometric Brownian motion price-path simulation.

use ndarray::{Array2, Array3, ArrayView1};

use crate::monte_carlo::rng::SimRng;
use crate::returns::{mean_returns, variance_population};

/// One GBM step: `prev * exp(drift + shock)`.
///
/// The shock is already scaled by the per-ticker volatility when called from
/// [`simulate_price_paths`].
#[inline]
pub fn gbm_step(prev: f64, drift: f64, shock: f64) -> f64 {
    prev * (drift + shock).exp()
}

/// Simulate future price paths for every ticker.
///
/// Drift and volatility are calibrated from the realized log returns:
/// per-ticker mean `mu`, population variance `sigma^2`, and
/// `drift = mu - sigma^2 / 2`. Each (price simulation, ticker) pair gets an
/// independent shock sequence `N(0, sigma)`; the path is the last realized
/// price compounded by `exp(drift + shock)` along the simulated-date axis.
///
/// Output shape: (num_sim_dates, num_price_sims, num_tickers). Draw order is
/// fixed (ticker-major, then price simulation, then date), so a given RNG
/// state always yields the same tensor.
pub fn simulate_price_paths(
    last_prices: ArrayView1<'_, f64>,
    log_returns: &Array2<f64>,
    num_sim_dates: usize,
    num_price_sims: usize,
    rng: &mut SimRng,
) -> Array3<f64> {
    let num_tickers = log_returns.ncols();
    debug_assert_eq!(last_prices.len(), num_tickers);

    let mu = mean_returns(log_returns);
    let sigma_squared = variance_population(log_returns);
    let sigma = sigma_squared.mapv(f64::sqrt);
    let drift = &mu - &(&sigma_squared / 2.0);

    let mut paths = Array3::zeros((num_sim_dates, num_price_sims, num_tickers));
    for k in 0..num_tickers {
        for s in 0..num_price_sims {
            let mut prev = last_prices[k];
            for d in 0..num_sim_dates {
                let shock = sigma[k] * rng.next_normal();
                prev = gbm_step(prev, drift[k], shock);
                paths[[d, s, k]] = prev;
            }
        }
    }
    paths
}
