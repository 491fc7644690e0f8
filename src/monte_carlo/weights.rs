//! Stage b: candidate weight sampling.

use ndarray::{Array2, Array3};

use crate::monte_carlo::rng::SimRng;

/// A candidate row whose raw sum is closer to zero than this is redrawn, so
/// normalization never divides by a vanishing sum.
const MIN_RAW_SUM: f64 = 1e-12;

/// Draw `num_weight_sims` candidate weight vectors of i.i.d. standard
/// normals, each row normalized to sum to 1.
///
/// Negative entries survive normalization, so candidates carry implicit
/// short positions. Output shape: (num_weight_sims, num_tickers). Redraws
/// for near-zero row sums consume the same RNG stream, so the output is
/// still fully determined by the generator state.
pub fn sample_weights(
    num_weight_sims: usize,
    num_tickers: usize,
    rng: &mut SimRng,
) -> Array2<f64> {
    let mut weights = Array2::zeros((num_weight_sims, num_tickers));
    for w in 0..num_weight_sims {
        loop {
            let raw: Vec<f64> = (0..num_tickers).map(|_| rng.next_normal()).collect();
            let sum: f64 = raw.iter().sum();
            if sum.abs() < MIN_RAW_SUM {
                continue;
            }
            for (k, value) in raw.iter().enumerate() {
                weights[[w, k]] = value / sum;
            }
            break;
        }
    }
    weights
}

/// Replicate the candidate matrix across a simulated-date axis, producing
/// the (num_sim_dates, num_weight_sims, num_tickers) tensor the scoring
/// stage logically operates on.
///
/// Invariant: for every weight-simulation index the weight vector is
/// bit-identical at every simulated date, and it is independent of the
/// price-simulation slice it is evaluated against.
pub fn broadcast_weights(weights: &Array2<f64>, num_sim_dates: usize) -> Array3<f64> {
    let (num_weight_sims, num_tickers) = weights.dim();
    Array3::from_shape_fn((num_sim_dates, num_weight_sims, num_tickers), |(_, w, k)| {
        weights[[w, k]]
    })
}
