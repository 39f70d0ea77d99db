//! Equity screener: CAPM hurdle rate plus one-period dividend growth model.

use crate::domain::capm;
use crate::domain::repository::MarketDataRepository;
use std::collections::BTreeSet;

/// Screen the whole universe at the current trade date and return the
/// symbols whose expected return clears their hurdle rate and whose
/// intrinsic value exceeds the market price.
pub fn screen_equities(repo: &MarketDataRepository) -> BTreeSet<String> {
    repo.symbols()
        .iter()
        .filter(|s| test_symbol(repo, s))
        .cloned()
        .collect()
}

/// One-period dividend growth test for a single symbol. Degenerate inputs
/// (no regression fit, non-positive latest price, hurdle rate of -1) screen
/// the symbol out rather than poisoning the run with NaN or infinity.
pub fn test_symbol(repo: &MarketDataRepository, symbol: &str) -> bool {
    let k = match capm::cost_of_equity(repo, symbol) {
        Ok(k) => k,
        Err(e) => {
            eprintln!("warning: screening out {symbol} ({e})");
            return false;
        }
    };
    if !k.is_finite() || (1.0 + k).abs() < f64::EPSILON {
        return false;
    }

    let growth_rate = compute_growth_rate(
        repo.latest_return_on_equity(symbol),
        repo.latest_payout_ratio(symbol),
    );

    let latest_price = match repo.past_stock_prices(symbol).last() {
        Some((_, p)) if p > 0.0 => p,
        _ => return false,
    };
    let latest_dividend = repo
        .past_stock_dividends(symbol)
        .last()
        .map(|(_, v)| v)
        .unwrap_or(0.0);

    // E(P1), E(D1)
    let forecasted_price = latest_price * (1.0 + growth_rate);
    let forecasted_dividend = latest_dividend * (1.0 + growth_rate);

    // E(r)
    let expected_return = (forecasted_dividend + forecasted_price - latest_price) / latest_price;
    // V0
    let intrinsic_value = (forecasted_dividend + forecasted_price) / (1.0 + k);

    expected_return > k && intrinsic_value > latest_price
}

/// Sustainable growth: `g = ROE (1 - payout ratio)`.
fn compute_growth_rate(return_on_equity: f64, payout_ratio: f64) -> f64 {
    return_on_equity * (1.0 - payout_ratio)
}
