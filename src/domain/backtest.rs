//! Walk-forward backtest driver.
//!
//! Advances the repository clock one calendar day at a time and re-runs the
//! full pipeline: refit regressions, screen, optimize, then realize that
//! day's portfolio return out of the `>= trade_date` partition. Days with
//! alignment gaps in the data are skipped; every other error aborts the run.

use crate::domain::error::TbtraderError;
use crate::domain::metrics::{EquityPoint, Metrics};
use crate::domain::optimizer;
use crate::domain::repository::{MarketDataRepository, INDEX_SYMBOL};
use crate::domain::screener;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Start of the data window handed to the data source.
    pub data_from: NaiveDate,
    /// First simulated trade date.
    pub start_date: NaiveDate,
    /// Last simulated trade date (inclusive).
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Annual risk-free rate used for Sharpe/Sortino.
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
    /// Days skipped because of per-day data gaps.
    pub skipped_days: usize,
    /// Trading days actually simulated.
    pub simulated_days: usize,
}

pub fn run_backtest(
    repo: &mut MarketDataRepository,
    config: &BacktestConfig,
) -> Result<BacktestResult, TbtraderError> {
    let mut equity = config.initial_capital;
    let mut equity_curve: Vec<EquityPoint> = Vec::new();
    let mut skipped_days = 0usize;
    let mut simulated_days = 0usize;

    while repo.trade_date() <= config.end_date {
        let today = repo.trade_date();

        // Only index trading days move the portfolio; weekends and holidays
        // just advance the clock.
        if repo.new_index_returns().get(today).is_none() {
            repo.increment();
            continue;
        }

        match step_day(repo, today, &mut equity) {
            Ok(()) => {
                simulated_days += 1;
                equity_curve.push(EquityPoint {
                    date: today,
                    equity,
                });
            }
            Err(e) if e.is_data_gap() => {
                eprintln!("warning: skipping {today} ({e})");
                skipped_days += 1;
            }
            Err(e) => return Err(e),
        }

        repo.increment();
    }

    let metrics = Metrics::compute(&equity_curve, config.initial_capital, config.risk_free_rate);

    Ok(BacktestResult {
        equity_curve,
        metrics,
        skipped_days,
        simulated_days,
    })
}

/// One pipeline pass: refit, screen, optimize, realize the day's return.
fn step_day(
    repo: &mut MarketDataRepository,
    today: NaiveDate,
    equity: &mut f64,
) -> Result<(), TbtraderError> {
    repo.recompute_regressions()?;
    let selection = screener::screen_equities(repo);
    let allocation = optimizer::calculate(repo, &selection)?;

    let mut day_return = 0.0;
    for (symbol, weight) in &allocation {
        let realized = if symbol == INDEX_SYMBOL {
            repo.new_index_returns().get(today)
        } else {
            repo.new_stock_returns(symbol).get(today)
        };
        // A position without a return today contributes nothing.
        day_return += weight * realized.unwrap_or(0.0);
    }
    *equity *= 1.0 + day_return;
    Ok(())
}
