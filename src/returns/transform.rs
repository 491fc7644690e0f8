//! Pure numeric transforms from price matrices to return statistics.
//!
//! All functions are deterministic and stateless. Shapes follow the
//! (dates, tickers) convention, so a return matrix derived from `n` dates
//! has `n - 1` rows.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};

use crate::core::error::{OptifolioError, Result};

/// Elementwise check that a price matrix can feed a ratio-of-closes return.
fn check_positive(prices: &Array2<f64>) -> Result<()> {
    for ((date, ticker), &value) in prices.indexed_iter() {
        if !(value.is_finite() && value > 0.0) {
            return Err(OptifolioError::NonPositivePrice { date, ticker, value });
        }
    }
    Ok(())
}

/// Log returns `ln(p[t] / p[t-1])` per ticker, shape (dates - 1, tickers).
///
/// # Errors
/// `NonPositivePrice` if any entry is `<= 0`, `InsufficientData` if fewer
/// than 2 dates are supplied.
pub fn log_returns(prices: &Array2<f64>) -> Result<Array2<f64>> {
    if prices.nrows() < 2 {
        return Err(OptifolioError::insufficient_data(2, prices.nrows()));
    }
    check_positive(prices)?;

    let (dates, tickers) = prices.dim();
    let mut returns = Array2::zeros((dates - 1, tickers));
    for t in 1..dates {
        for k in 0..tickers {
            returns[[t - 1, k]] = (prices[[t, k]] / prices[[t - 1, k]]).ln();
        }
    }
    Ok(returns)
}

/// Simple returns `(p[t] - p[t-1]) / p[t-1]` per ticker, shape
/// (dates - 1, tickers). This is the Markowitz input; the Monte Carlo and
/// evaluation paths work from log returns instead.
pub fn simple_returns(prices: &Array2<f64>) -> Result<Array2<f64>> {
    if prices.nrows() < 2 {
        return Err(OptifolioError::insufficient_data(2, prices.nrows()));
    }
    check_positive(prices)?;

    let (dates, tickers) = prices.dim();
    let mut returns = Array2::zeros((dates - 1, tickers));
    for t in 1..dates {
        for k in 0..tickers {
            let prev = prices[[t - 1, k]];
            returns[[t - 1, k]] = (prices[[t, k]] - prev) / prev;
        }
    }
    Ok(returns)
}

/// Arithmetic returns `exp(r) - 1` from log returns. Used when compounding
/// must be linear, e.g. for Sharpe evaluation of a weighted portfolio.
pub fn arithmetic_returns(log_returns: &Array2<f64>) -> Array2<f64> {
    log_returns.mapv(|r| r.exp() - 1.0)
}

/// Column-wise arithmetic mean, one entry per ticker.
pub fn mean_returns(returns: &Array2<f64>) -> Array1<f64> {
    let n = returns.nrows() as f64;
    returns.sum_axis(Axis(0)) / n
}

/// Column-wise population variance (divide by N), one entry per ticker.
/// This is the estimator the GBM calibration uses.
pub fn variance_population(returns: &Array2<f64>) -> Array1<f64> {
    let n = returns.nrows() as f64;
    let means = mean_returns(returns);
    let mut variances = Array1::zeros(returns.ncols());
    for (k, mean) in means.iter().enumerate() {
        let ss: f64 = returns.column(k).iter().map(|r| (r - mean).powi(2)).sum();
        variances[k] = ss / n;
    }
    variances
}

/// Covariance matrix of the return columns, dividing the residual
/// outer-product sum by the observation count N.
///
/// This is a biased estimator, kept deliberately: the Markowitz closed form
/// calibrates on it while the performance evaluator's std uses the Bessel
/// (N - 1) correction. Reconciling the two changes which branch the solver
/// takes on near-degenerate inputs, so the split is preserved as-is.
pub fn covariance_biased(returns: &Array2<f64>) -> DMatrix<f64> {
    let (n, tickers) = returns.dim();
    let means = mean_returns(returns);

    // residuals as an nalgebra matrix, (observations, tickers)
    let resid = DMatrix::from_fn(n, tickers, |t, k| returns[[t, k]] - means[k]);
    resid.transpose() * &resid / n as f64
}
