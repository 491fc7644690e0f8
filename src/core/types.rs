//! Core data types for Optifolio.

use ndarray::{Array1, Array2, ArrayView1};

use crate::core::error::{OptifolioError, Result};

/// Type alias for price values.
pub type Price = f64;

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Dense close-price history, shape (dates, tickers).
///
/// Every ticker column has a value for every date in range; the ingestion
/// layer guarantees no gaps before this type is built. Entries are validated
/// to be strictly positive on construction, after which the matrix is
/// immutable.
#[derive(Debug, Clone)]
pub struct PriceMatrix {
    tickers: Vec<String>,
    data: Array2<Price>,
}

impl PriceMatrix {
    /// Build a price matrix from ticker labels and a (dates, tickers) array.
    ///
    /// # Errors
    /// - `LengthMismatch` if the column count differs from the ticker count.
    /// - `InsufficientData` if fewer than 2 dates are present (returns need
    ///   consecutive closes).
    /// - `NonPositivePrice` if any entry is `<= 0` or non-finite.
    pub fn new(tickers: Vec<String>, data: Array2<Price>) -> Result<Self> {
        if data.ncols() != tickers.len() {
            return Err(OptifolioError::length_mismatch(tickers.len(), data.ncols()));
        }
        if data.nrows() < 2 {
            return Err(OptifolioError::insufficient_data(2, data.nrows()));
        }
        for ((date, ticker), &value) in data.indexed_iter() {
            if !(value.is_finite() && value > 0.0) {
                return Err(OptifolioError::NonPositivePrice { date, ticker, value });
            }
        }
        Ok(Self { tickers, data })
    }

    /// Ticker labels, in column order.
    #[inline]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Number of dates (rows).
    #[inline]
    pub fn num_dates(&self) -> usize {
        self.data.nrows()
    }

    /// Number of tickers (columns).
    #[inline]
    pub fn num_tickers(&self) -> usize {
        self.data.ncols()
    }

    /// The full (dates, tickers) price array.
    #[inline]
    pub fn data(&self) -> &Array2<Price> {
        &self.data
    }

    /// Closing prices on the most recent date, one per ticker.
    pub fn last_prices(&self) -> ArrayView1<'_, Price> {
        self.data.row(self.data.nrows() - 1)
    }
}

/// Check a weight vector against the ticker count and the sum-to-one
/// invariant shared by both engines.
pub fn validate_weights(weights: &Array1<f64>, num_tickers: usize) -> Result<()> {
    if weights.len() != num_tickers {
        return Err(OptifolioError::length_mismatch(num_tickers, weights.len()));
    }
    let sum: f64 = weights.sum();
    if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(OptifolioError::invalid_parameter(format!(
            "weight vector sums to {sum}, expected 1 within {WEIGHT_SUM_TOLERANCE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_price_matrix_rejects_non_positive() {
        let data = array![[100.0, 50.0], [101.0, 0.0]];
        let err = PriceMatrix::new(vec!["A".into(), "B".into()], data).unwrap_err();
        match err {
            OptifolioError::NonPositivePrice { date, ticker, .. } => {
                assert_eq!((date, ticker), (1, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_price_matrix_rejects_shape_mismatch() {
        let data = array![[100.0, 50.0], [101.0, 51.0]];
        let err = PriceMatrix::new(vec!["A".into()], data).unwrap_err();
        assert!(matches!(err, OptifolioError::LengthMismatch { expected: 1, actual: 2 }));
    }

    #[test]
    fn test_price_matrix_needs_two_dates() {
        let data = array![[100.0, 50.0]];
        let err = PriceMatrix::new(vec!["A".into(), "B".into()], data).unwrap_err();
        assert!(matches!(err, OptifolioError::InsufficientData { required: 2, available: 1 }));
    }

    #[test]
    fn test_last_prices() {
        let data = array![[100.0, 50.0], [102.0, 49.0], [104.0, 48.0]];
        let prices = PriceMatrix::new(vec!["A".into(), "B".into()], data).unwrap();
        assert_eq!(prices.last_prices().to_vec(), vec![104.0, 48.0]);
    }

    #[test]
    fn test_validate_weights() {
        let weights = array![0.6, 0.4];
        assert!(validate_weights(&weights, 2).is_ok());
        assert!(validate_weights(&weights, 3).is_err());
        let bad = array![0.6, 0.3];
        assert!(validate_weights(&bad, 2).is_err());
    }
}
