//! Mean-variance (Markowitz) weight solver.
//!
//! Implements two-fund separation: the returned portfolio is either the
//! minimum-variance portfolio or a blend of it with the tangency portfolio,
//! depending on where the implied target return sits. The three-way branch
//! below mirrors the theorem's degenerate cases exactly; small numeric
//! differences flip which branch is taken, so the order of checks matters.

use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

use crate::core::error::{OptifolioError, Result};
use crate::core::types::PriceMatrix;
use crate::returns::{covariance_biased, mean_returns, simple_returns};

/// Relative tolerance for the equal-mean check (numpy `allclose` defaults).
const EQUAL_MEAN_RTOL: f64 = 1e-5;
/// Absolute tolerance for the equal-mean check.
const EQUAL_MEAN_ATOL: f64 = 1e-8;
/// Singular-value cutoff for the pseudo-inverse fallback.
const PINV_EPS: f64 = 1e-10;
/// Max elementwise deviation of `cov * inv(cov)` from identity before the
/// inverse is considered untrustworthy and the solve falls back to the
/// pseudo-inverse. Near-singular matrices (e.g. perfectly correlated assets
/// up to rounding) pass LU inversion but fail this check.
const RECONSTRUCTION_TOL: f64 = 1e-6;

/// Result of a Markowitz solve.
#[derive(Debug, Clone)]
pub struct MarkowitzSolution {
    /// Optimal weights, one per ticker, summing to 1. Entries may be
    /// negative (short positions).
    pub weights: Array1<f64>,
    /// The implied target return the solve aimed for.
    pub target_return: f64,
    /// Set when the covariance matrix was singular and the solve fell back
    /// to a least-squares pseudo-inverse. Absorbed rather than surfaced as
    /// an error, but callers should know the numerics changed.
    pub used_pseudo_inverse: bool,
}

/// Closed-form mean-variance solver.
#[derive(Debug, Clone)]
pub struct MarkowitzSolver {
    /// Risk-aversion multiplier applied to the efficient-frontier offset
    /// when computing the implied target return.
    pub lambda: f64,
}

impl Default for MarkowitzSolver {
    fn default() -> Self {
        Self { lambda: 1.0 }
    }
}

impl MarkowitzSolver {
    /// Create a solver with the given risk-aversion multiplier.
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }

    /// Solve for mean-variance-efficient weights over the full price history.
    ///
    /// # Errors
    /// - `InfeasibleTarget` when every asset carries the same mean return and
    ///   that mean sits below the implied target.
    /// - `InvalidParameter` if `lambda` is non-finite.
    ///
    /// A singular covariance matrix is not an error: the solve falls back to
    /// the SVD pseudo-inverse and flags `used_pseudo_inverse`.
    pub fn solve(&self, prices: &PriceMatrix) -> Result<MarkowitzSolution> {
        if !self.lambda.is_finite() {
            return Err(OptifolioError::invalid_parameter(format!(
                "lambda must be finite, got {}",
                self.lambda
            )));
        }

        // Simple returns between consecutive closes, not log returns.
        let returns = simple_returns(prices.data())?;
        let means_nd = mean_returns(&returns);
        let means = DVector::from_iterator(means_nd.len(), means_nd.iter().copied());
        let cov = covariance_biased(&returns);

        let (inv_cov, used_pseudo_inverse) = invert_or_pseudo(cov)?;

        let num_tickers = means.len();
        let ones = DVector::from_element(num_tickers, 1.0);

        // w_mv = Sigma^-1 1 / (1' Sigma^-1 1)
        let inv_sum: f64 = (&inv_cov * &ones).sum();
        let min_var = (&inv_cov * &ones) / inv_sum;

        // delta = (1' S^-1 1)(mu' S^-1 mu) - (1' S^-1 mu)^2
        let inv_mu = &inv_cov * &means;
        let delta = inv_sum * means.dot(&inv_mu) - inv_mu.sum().powi(2);

        let mv_return = min_var.dot(&means);
        let target_return = mv_return + self.lambda * delta / inv_sum;

        if all_means_equal(&means) {
            // Constant-mean assets: the frontier collapses to a point. Either
            // the minimum-variance portfolio already attains the target or
            // nothing does.
            if means[0] < target_return {
                return Err(OptifolioError::InfeasibleTarget {
                    common_mean: means[0],
                    target: target_return,
                });
            }
            return Ok(solution(min_var, target_return, used_pseudo_inverse));
        }

        if mv_return >= target_return {
            // Minimum-variance portfolio already meets the target.
            return Ok(solution(min_var, target_return, used_pseudo_inverse));
        }

        // Blend toward the tangency portfolio along the efficient frontier.
        let tangency = &inv_mu / inv_mu.sum();
        let direction = tangency - &min_var;
        let alpha = (target_return - mv_return) / means.dot(&direction);
        let weights = min_var + direction * alpha;

        Ok(solution(weights, target_return, used_pseudo_inverse))
    }
}

/// Invert the covariance matrix, falling back to the SVD pseudo-inverse when
/// it is singular (fewer effective observations than assets, or perfectly
/// correlated columns).
fn invert_or_pseudo(cov: DMatrix<f64>) -> Result<(DMatrix<f64>, bool)> {
    if let Some(inverse) = cov.clone().try_inverse() {
        if inverse.iter().all(|v| v.is_finite()) && reconstructs_identity(&cov, &inverse) {
            return Ok((inverse, false));
        }
    }
    let pinv = cov
        .pseudo_inverse(PINV_EPS)
        .map_err(OptifolioError::invalid_parameter)?;
    Ok((pinv, true))
}

/// `cov * inverse` should be the identity up to rounding; a large deviation
/// means the matrix was numerically singular and the inverse is noise.
fn reconstructs_identity(cov: &DMatrix<f64>, inverse: &DMatrix<f64>) -> bool {
    let product = cov * inverse;
    let n = cov.nrows();
    for i in 0..n {
        for j in 0..n {
            let expected = if i == j { 1.0 } else { 0.0 };
            if (product[(i, j)] - expected).abs() > RECONSTRUCTION_TOL {
                return false;
            }
        }
    }
    true
}

/// Means are treated as equal under numpy-`allclose` tolerances, matching the
/// branch condition of the reference formulation.
fn all_means_equal(means: &DVector<f64>) -> bool {
    let first = means[0];
    means
        .iter()
        .all(|m| (m - first).abs() <= EQUAL_MEAN_ATOL + EQUAL_MEAN_RTOL * first.abs())
}

fn solution(weights: DVector<f64>, target_return: f64, used_pseudo_inverse: bool) -> MarkowitzSolution {
    MarkowitzSolution {
        weights: Array1::from_iter(weights.iter().copied()),
        target_return,
        used_pseudo_inverse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn price_matrix(columns: &[Vec<f64>]) -> PriceMatrix {
        let dates = columns[0].len();
        let tickers = columns.len();
        let data = Array2::from_shape_fn((dates, tickers), |(t, k)| columns[k][t]);
        let labels = (0..tickers).map(|k| format!("T{k}")).collect();
        PriceMatrix::new(labels, data).unwrap()
    }

    #[test]
    fn test_weights_sum_to_one() {
        let prices = price_matrix(&[
            vec![100.0, 101.0, 99.5, 103.0, 104.2, 102.8],
            vec![50.0, 50.5, 51.2, 50.1, 52.0, 52.4],
            vec![20.0, 19.8, 20.3, 20.7, 20.2, 21.0],
        ]);
        let solution = MarkowitzSolver::default().solve(&prices).unwrap();
        assert!((solution.weights.sum() - 1.0).abs() < 1e-6);
        assert!(!solution.used_pseudo_inverse);
    }

    /// Build a price history whose simple returns reproduce `returns`
    /// (per-asset) up to floating noise.
    fn prices_from_returns(returns: &[Vec<f64>]) -> PriceMatrix {
        let columns: Vec<Vec<f64>> = returns
            .iter()
            .map(|asset| {
                let mut prices = vec![100.0];
                for r in asset {
                    let last = *prices.last().unwrap();
                    prices.push(last * (1.0 + r));
                }
                prices
            })
            .collect();
        price_matrix(&columns)
    }

    // Two assets with means equal within `allclose` tolerance but not
    // exactly equal, and orthogonal residuals so the covariance matrix is
    // diagonal. With an exactly-common mean the frontier offset `delta` is
    // identically zero, so the infeasible case only arises from a small
    // mean gap like this one.
    fn near_equal_mean_returns(mean_gap: f64) -> Vec<Vec<f64>> {
        let c = 0.01;
        let m2 = c + mean_gap;
        vec![
            vec![c - 0.02, c, c + 0.02],
            vec![m2 + 0.01, m2 - 0.02, m2 + 0.01],
        ]
    }

    #[test]
    fn test_equal_means_below_target_is_infeasible() {
        // Asset 0 has the (slightly) lower mean, which lands below the
        // implied target return.
        let prices = prices_from_returns(&near_equal_mean_returns(5e-8));
        match MarkowitzSolver::default().solve(&prices) {
            Err(OptifolioError::InfeasibleTarget { common_mean, target }) => {
                assert!((common_mean - 0.01).abs() < 1e-9);
                assert!(common_mean < target);
            }
            other => panic!("expected InfeasibleTarget, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_means_at_target_returns_min_var() {
        // Asset 0 now has the higher mean, so the target sits below it and
        // the minimum-variance portfolio is returned as-is.
        let prices = prices_from_returns(&near_equal_mean_returns(-5e-8));
        let solution = MarkowitzSolver::default().solve(&prices).unwrap();
        assert!((solution.weights.sum() - 1.0).abs() < 1e-6);
        // Diagonal covariance diag(2d^2/3, 2e^2) with d = 0.02, e = 0.01
        // gives min-var weights proportional to the inverse variances:
        // (3750, 5000) / 8750 = (3/7, 4/7).
        assert!((solution.weights[0] - 3.0 / 7.0).abs() < 1e-6);
        assert!((solution.weights[1] - 4.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_singular_covariance_uses_pseudo_inverse() {
        // Asset 1 repeats asset 0's return deviations shifted by a constant:
        // identical residuals, rank-1 covariance, but distinct means (so the
        // equal-mean branch stays out of play).
        let deviations = [0.02, -0.01, 0.0, 0.01, -0.02, 0.015];
        let asset0: Vec<f64> = deviations.iter().map(|d| 0.01 + d).collect();
        let asset1: Vec<f64> = deviations.iter().map(|d| 0.012 + d).collect();
        let prices = prices_from_returns(&[asset0, asset1]);
        let solution = MarkowitzSolver::default().solve(&prices).unwrap();
        assert!(solution.used_pseudo_inverse);
        assert!((solution.weights.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_branch_hits_target_return() {
        // Distinct means force the blend toward the tangency portfolio; the
        // blended portfolio's expected return must equal the target.
        let prices = price_matrix(&[
            vec![100.0, 103.0, 101.0, 106.0, 104.0, 109.0],
            vec![50.0, 50.2, 50.1, 50.4, 50.3, 50.6],
            vec![20.0, 19.9, 20.2, 20.0, 20.4, 20.3],
        ]);
        let solution = MarkowitzSolver::default().solve(&prices).unwrap();

        let returns = simple_returns(prices.data()).unwrap();
        let means = mean_returns(&returns);
        let realized: f64 = solution
            .weights
            .iter()
            .zip(means.iter())
            .map(|(w, m)| w * m)
            .sum();
        assert!((realized - solution.target_return).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_lambda_rejected() {
        let prices = price_matrix(&[
            vec![100.0, 101.0, 99.5],
            vec![50.0, 50.5, 51.2],
        ]);
        assert!(MarkowitzSolver::new(f64::NAN).solve(&prices).is_err());
    }
}
