//! Annualized Sharpe evaluation of a weight vector against realized prices.

use ndarray::Array1;

use crate::core::error::{OptifolioError, Result};
use crate::core::types::PriceMatrix;
use crate::returns::{arithmetic_returns, log_returns};

/// Trading days per year used for (de-)annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Scores weight vectors by annualized Sharpe ratio over realized history.
///
/// Both engines' outputs go through this evaluator unchanged, so the two
/// strategies are directly comparable.
#[derive(Debug, Clone)]
pub struct PerformanceEvaluator {
    /// Annual risk-free rate; de-annualized internally to a daily rate.
    pub risk_free_rate: f64,
}

impl Default for PerformanceEvaluator {
    fn default() -> Self {
        Self { risk_free_rate: 0.0 }
    }
}

impl PerformanceEvaluator {
    /// Create an evaluator with the given annual risk-free rate.
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// Annualized Sharpe ratio of the weighted portfolio over the realized
    /// price history.
    ///
    /// Daily portfolio returns are the weighted sum of per-ticker arithmetic
    /// returns (`exp(log_return) - 1`), so compounding stays linear across
    /// tickers. The std uses the Bessel (N - 1) correction; note this is the
    /// unbiased estimator, unlike the Markowitz calibration which divides by
    /// N. The supplied annual rate is de-annualized to
    /// `(1 + rfr)^(1/252) - 1` before the excess return is formed, and the
    /// ratio is scaled by `sqrt(252)`.
    ///
    /// # Errors
    /// - `LengthMismatch` if the weight count differs from the ticker count.
    /// - `DegenerateVolatility` when the portfolio return std is zero; a
    ///   non-finite score is never returned.
    pub fn annualized_sharpe(&self, weights: &Array1<f64>, prices: &PriceMatrix) -> Result<f64> {
        if weights.len() != prices.num_tickers() {
            return Err(OptifolioError::length_mismatch(prices.num_tickers(), weights.len()));
        }

        let log = log_returns(prices.data())?;
        let arith = arithmetic_returns(&log);
        let portfolio = arith.dot(weights);

        let n = portfolio.len();
        if n < 2 {
            return Err(OptifolioError::insufficient_data(2, n));
        }

        let mean = portfolio.sum() / n as f64;
        let ss: f64 = portfolio.iter().map(|r| (r - mean).powi(2)).sum();
        let std = (ss / (n - 1) as f64).sqrt();

        if std == 0.0 {
            return Err(OptifolioError::degenerate_volatility(
                "realized portfolio return series",
            ));
        }

        let rfr_daily = (1.0 + self.risk_free_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
        let sharpe = (mean - rfr_daily) / std;
        Ok(sharpe * TRADING_DAYS_PER_YEAR.sqrt())
    }
}
