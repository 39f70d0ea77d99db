//! Treynor-Black optimal risky portfolio.
//!
//! Blends an active portfolio of screened securities, weighted by
//! alpha over residual variance, with a passive index position. Works in
//! daily units throughout: daily geometric mean market return over daily
//! sample variance.

use crate::domain::capm;
use crate::domain::error::TbtraderError;
use crate::domain::repository::{MarketDataRepository, INDEX_SYMBOL};
use crate::ports::execution_port::ExecutionPort;
use std::collections::{BTreeSet, HashMap};

/// Target weight per symbol; the index pseudo-symbol carries the passive
/// position. Weights can be negative (shorts). By construction the index
/// weight is one minus the active weight, so the vector sums to one.
pub type Allocation = HashMap<String, f64>;

/// Bound on the fractional-share adjustment retry loop.
const MAX_ADJUSTMENT_ATTEMPTS: usize = 5;

/// Single-index optimal risky portfolio over `selection`. An empty
/// selection allocates everything to the passive index.
pub fn calculate(
    repo: &MarketDataRepository,
    selection: &BTreeSet<String>,
) -> Result<Allocation, TbtraderError> {
    let mut allocation = Allocation::new();

    if selection.is_empty() {
        allocation.insert(INDEX_SYMBOL.to_string(), 1.0);
        return Ok(allocation);
    }

    let regressions = repo.regression_results_for(selection)?;

    // Initial active weights: alpha over residual variance, scaled to sum 1.
    let initial_weights: HashMap<&String, f64> = regressions
        .iter()
        .map(|(s, r)| (s, r.alpha / r.mean_square_error))
        .collect();
    let total: f64 = initial_weights.values().sum();
    let scaled_weights: HashMap<&String, f64> = initial_weights
        .iter()
        .map(|(&s, w)| (s, w / total))
        .collect();

    let weighted_alpha: f64 = scaled_weights
        .iter()
        .map(|(s, w)| w * regressions[*s].alpha)
        .sum();
    let weighted_residual_variance: f64 = scaled_weights
        .iter()
        .map(|(s, w)| w.powi(2) * regressions[*s].mean_square_error)
        .sum();
    let weighted_beta: f64 = scaled_weights
        .iter()
        .map(|(s, w)| w * regressions[*s].beta)
        .sum();

    let past_index_returns = repo.past_index_returns();
    let market_variance = past_index_returns.sample_variance();
    let erm = capm::mean_market_return_daily(&past_index_returns);

    let active_weight = (weighted_alpha / weighted_residual_variance) / (erm / market_variance);
    let active_weight = active_weight / (1.0 + (1.0 - weighted_beta) * active_weight);

    for (s, w) in &scaled_weights {
        allocation.insert((*s).clone(), active_weight * w);
    }
    allocation.insert(INDEX_SYMBOL.to_string(), 1.0 - active_weight);
    Ok(allocation)
}

/// [`calculate`] plus the fractional-share adjustment for short positions:
/// the venue cannot short fractional shares, so every negative weight is
/// rounded to a whole-share notional. A symbol whose rounding deviates from
/// the target by more than `max_adjustment` (relative) is dropped and the
/// optimization re-run on the reduced selection, at most five times.
pub fn calculate_with_adjustment(
    repo: &MarketDataRepository,
    selection: &BTreeSet<String>,
    execution: &dyn ExecutionPort,
    cash: f64,
    max_adjustment: f64,
) -> Result<Allocation, TbtraderError> {
    let mut working = selection.clone();

    for _ in 0..MAX_ADJUSTMENT_ATTEMPTS {
        let mut allocation = calculate(repo, &working)?;
        let mut excluded: BTreeSet<String> = BTreeSet::new();

        for (symbol, weight) in allocation.iter_mut() {
            if *weight >= 0.0 || symbol == INDEX_SYMBOL {
                continue;
            }
            let Some(price) = execution.latest_price(symbol)? else {
                // No quote: keep the unrounded target weight.
                continue;
            };

            let notional = *weight * cash;
            let quantity = notional / price;
            let adj_quantity = quantity.round();
            let adj_notional = adj_quantity * price;
            let adjustment = (notional - adj_notional) / notional;

            if adjustment.abs() > max_adjustment {
                eprintln!(
                    "warning: excluding {symbol}, rounding adjustment too big: {adjustment:.4} \
                     (notional {notional:.2}, price {price:.2})"
                );
                excluded.insert(symbol.clone());
            } else {
                *weight = adj_notional / cash;
            }
        }

        if excluded.is_empty() {
            return Ok(allocation);
        }
        for symbol in excluded {
            working.remove(&symbol);
        }
    }

    Err(TbtraderError::NonConvergence {
        attempts: MAX_ADJUSTMENT_ATTEMPTS,
    })
}
