//! CAPM hurdle rate and mean market return.
//!
//! Unit convention: [`cost_of_equity`] works in annual units (annualized
//! mean market return against an annual T-bill rate); the optimizer works in
//! daily units via [`mean_market_return_daily`]. Both derive from the same
//! geometric mean, so compounding at the daily mean reproduces the series'
//! terminal value.

use crate::domain::error::TbtraderError;
use crate::domain::repository::MarketDataRepository;
use crate::domain::series::DatedSeries;

const DAYS_PER_YEAR: f64 = 365.0;

/// Geometric mean daily return: `(Π(1+r))^(1/n) - 1`.
pub fn mean_market_return_daily(index_returns: &DatedSeries) -> f64 {
    let n = index_returns.len();
    if n == 0 {
        return 0.0;
    }
    let growth: f64 = index_returns.values().map(|r| 1.0 + r).product();
    growth.powf(1.0 / n as f64) - 1.0
}

/// Annualized geometric mean daily return: `(1+gd)^365 - 1`.
pub fn mean_market_return_annualized(index_returns: &DatedSeries) -> f64 {
    (1.0 + mean_market_return_daily(index_returns)).powf(DAYS_PER_YEAR) - 1.0
}

/// Cost of equity (hurdle rate) for a symbol: `rf + beta (E(Rm) - rf)`.
/// The risk-free rate is the most recent past T-bill return, quoted in
/// percent; the expected market return is annualized.
pub fn cost_of_equity(
    repo: &MarketDataRepository,
    symbol: &str,
) -> Result<f64, TbtraderError> {
    let tb_returns = repo.past_tb_returns();
    let rf = tb_returns
        .last()
        .map(|(_, v)| v / 100.0)
        .ok_or(TbtraderError::NoRiskFreeData)?;
    let erm = mean_market_return_annualized(&repo.past_index_returns());
    let beta = repo.stock_regression_results(symbol)?.beta;
    Ok(rf + beta * (erm - rf))
}
