//! OLS regression of stock returns against index returns.

use crate::domain::error::TbtraderError;
use crate::domain::series::DatedSeries;

/// Minimum aligned points for a meaningful fit (MSE uses n-2 degrees of freedom).
pub const MIN_REGRESSION_POINTS: usize = 3;

/// Per-symbol single-index regression statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionStats {
    /// Slope of the fit: the stock's beta against the index.
    pub beta: f64,
    /// Intercept of the fit: the stock's alpha.
    pub alpha: f64,
    pub sum_squared_errors: f64,
    /// Residual variance, SSE / (n - 2).
    pub mean_square_error: f64,
    pub samples: usize,
}

/// Regress stock daily returns (dependent) on index daily returns
/// (independent) over the stock's date set. Every stock-return date must be
/// present in the index-return series; a missing date is a data-integrity
/// error, not a skipped point.
pub fn regress(
    symbol: &str,
    stock_returns: &DatedSeries,
    index_returns: &DatedSeries,
) -> Result<RegressionStats, TbtraderError> {
    let mut n = 0usize;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_yy = 0.0;

    for (date, y) in stock_returns.iter() {
        let x = index_returns
            .get(date)
            .ok_or_else(|| TbtraderError::MismatchedDates {
                symbol: symbol.to_string(),
                date,
            })?;
        n += 1;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
        sum_yy += y * y;
    }

    if n < MIN_REGRESSION_POINTS {
        return Err(TbtraderError::InsufficientData {
            symbol: symbol.to_string(),
            points: n,
            minimum: MIN_REGRESSION_POINTS,
        });
    }

    let nf = n as f64;
    let sxx = sum_xx - sum_x * sum_x / nf;
    let sxy = sum_xy - sum_x * sum_y / nf;
    let syy = sum_yy - sum_y * sum_y / nf;

    if sxx <= 0.0 {
        return Err(TbtraderError::DegenerateRegression {
            symbol: symbol.to_string(),
        });
    }

    let beta = sxy / sxx;
    let alpha = (sum_y - beta * sum_x) / nf;
    let sse = (syy - sxy * sxy / sxx).max(0.0);
    let mse = sse / (nf - 2.0);

    Ok(RegressionStats {
        beta,
        alpha,
        sum_squared_errors: sse,
        mean_square_error: mse,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn series(values: &[f64]) -> DatedSeries {
        DatedSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (date(i as u32 + 1), v)),
        )
    }

    #[test]
    fn exact_linear_fit() {
        let index = series(&[0.01, -0.02, 0.005, 0.015, -0.01]);
        let stock = series(&[0.022, -0.038, 0.012, 0.032, -0.018]);
        // stock = 0.002 + 2.0 * index exactly
        let stats = regress("TEST", &stock, &index).unwrap();

        assert_relative_eq!(stats.beta, 2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.alpha, 0.002, epsilon = 1e-12);
        assert_relative_eq!(stats.sum_squared_errors, 0.0, epsilon = 1e-15);
        assert_relative_eq!(stats.mean_square_error, 0.0, epsilon = 1e-15);
        assert_eq!(stats.samples, 5);
    }

    #[test]
    fn residuals_produce_positive_mse() {
        let index = series(&[0.01, -0.01, 0.02, -0.02, 0.0]);
        let stock = series(&[0.015, -0.005, 0.018, -0.025, 0.003]);
        let stats = regress("TEST", &stock, &index).unwrap();

        assert!(stats.sum_squared_errors > 0.0);
        assert!(stats.mean_square_error > 0.0);
        assert_relative_eq!(
            stats.mean_square_error,
            stats.sum_squared_errors / 3.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn missing_index_date_is_fatal() {
        let index = DatedSeries::from_pairs([(date(1), 0.0), (date(2), 0.01), (date(3), -0.01)]);
        let stock = DatedSeries::from_pairs([
            (date(1), 0.0),
            (date(2), 0.02),
            (date(4), 0.01), // not an index trading day
        ]);
        let err = regress("TEST", &stock, &index).unwrap_err();
        assert!(matches!(
            err,
            TbtraderError::MismatchedDates { ref symbol, date: d } if symbol == "TEST" && d == date(4)
        ));
    }

    #[test]
    fn too_few_points() {
        let index = series(&[0.01, -0.01]);
        let stock = series(&[0.02, -0.02]);
        let err = regress("TEST", &stock, &index).unwrap_err();
        assert!(matches!(
            err,
            TbtraderError::InsufficientData { points: 2, minimum: 3, .. }
        ));
    }

    #[test]
    fn flat_index_is_degenerate() {
        let index = series(&[0.0, 0.0, 0.0, 0.0]);
        let stock = series(&[0.01, -0.01, 0.02, 0.0]);
        let err = regress("TEST", &stock, &index).unwrap_err();
        assert!(matches!(err, TbtraderError::DegenerateRegression { .. }));
    }
}
