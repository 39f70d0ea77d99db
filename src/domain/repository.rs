//! Point-in-time market data repository.
//!
//! Owns the simulation clock (the trade date) and serves every series split
//! into a "past" view (strictly before the trade date, safe to fit on) and a
//! "new" view (at or after the trade date, used only to realize next-period
//! performance). All series are loaded once from an injected [`DataSource`];
//! the repository never fetches on its own after initialization.

use crate::domain::error::TbtraderError;
use crate::domain::regression::{self, RegressionStats};
use crate::domain::series::DatedSeries;
use crate::ports::data_port::DataSource;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeSet, HashMap};

/// Pseudo-symbol for the passive index position.
pub const INDEX_SYMBOL: &str = "GSPC";

/// Minimum past price points for a symbol to enter the universe
/// (roughly three trading years).
pub const MIN_HISTORY_POINTS: usize = 750;

/// Minimum index price points required at initialization.
pub const MIN_INDEX_POINTS: usize = 750;

/// Minimum past T-bill returns required at initialization.
pub const MIN_TB_RETURNS: usize = 1;

#[derive(Debug)]
pub struct MarketDataRepository {
    trade_date: NaiveDate,
    index_prices: DatedSeries,
    index_returns: DatedSeries,
    tb_returns: DatedSeries,
    symbols: BTreeSet<String>,
    stock_prices: HashMap<String, DatedSeries>,
    stock_returns: HashMap<String, DatedSeries>,
    stock_dividends: HashMap<String, DatedSeries>,
    stock_roe: HashMap<String, DatedSeries>,
    stock_payout_ratio: HashMap<String, DatedSeries>,
    regression_results: HashMap<String, RegressionStats>,
}

impl MarketDataRepository {
    /// Load every series for `[from, to]` from the data source, derive
    /// returns, and filter the universe down to symbols with at least
    /// [`MIN_HISTORY_POINTS`] price points before `trade_date`. Symbols
    /// failing that bar are excluded for the whole run.
    pub fn initialize(
        source: &dyn DataSource,
        trade_date: NaiveDate,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self, TbtraderError> {
        let all_symbols = source.list_symbols()?;
        let all_symbols: BTreeSet<String> = all_symbols.into_iter().collect();

        let index_prices = source.index_prices(from, to)?;
        if index_prices.len() < MIN_INDEX_POINTS {
            return Err(TbtraderError::InsufficientIndexHistory {
                points: index_prices.len(),
                minimum: MIN_INDEX_POINTS,
            });
        }
        let index_returns = index_prices.to_returns();

        let tb_returns = source.tbill_returns(from, to)?;
        if tb_returns.before(trade_date).len() < MIN_TB_RETURNS {
            return Err(TbtraderError::NoRiskFreeData);
        }

        let all_prices = source.stock_prices(&all_symbols, from, to)?;
        let symbols: BTreeSet<String> = all_symbols
            .iter()
            .filter(|s| {
                all_prices
                    .get(*s)
                    .map(|p| p.before(trade_date).len() >= MIN_HISTORY_POINTS)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let stock_dividends = source.stock_dividends(&symbols, from, to)?;
        let stock_roe = source.stock_return_on_equity(&symbols, from, to)?;
        let stock_payout_ratio = source.stock_payout_ratios(&symbols, from, to)?;

        let mut stock_prices = HashMap::new();
        let mut stock_returns = HashMap::new();
        for symbol in &symbols {
            let prices = all_prices[symbol].clone();
            stock_returns.insert(symbol.clone(), prices.to_returns());
            stock_prices.insert(symbol.clone(), prices);
        }

        Ok(Self {
            trade_date,
            index_prices,
            index_returns,
            tb_returns,
            symbols,
            stock_prices,
            stock_returns,
            stock_dividends,
            stock_roe,
            stock_payout_ratio,
            regression_results: HashMap::new(),
        })
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }

    /// Symbols that passed the history filter at initialization.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn index_prices(&self) -> &DatedSeries {
        &self.index_prices
    }

    // Past views: strictly before the trade date.

    pub fn past_stock_prices(&self, symbol: &str) -> DatedSeries {
        self.stock_prices
            .get(symbol)
            .map(|s| s.before(self.trade_date))
            .unwrap_or_default()
    }

    pub fn past_stock_returns(&self, symbol: &str) -> DatedSeries {
        self.stock_returns
            .get(symbol)
            .map(|s| s.before(self.trade_date))
            .unwrap_or_default()
    }

    /// Past dividends; a symbol with no dividend history gets a synthetic
    /// zero entry one day before the trade date so valuation math never
    /// reads an empty series.
    pub fn past_stock_dividends(&self, symbol: &str) -> DatedSeries {
        let mut dividends = self
            .stock_dividends
            .get(symbol)
            .map(|s| s.before(self.trade_date))
            .unwrap_or_default();
        if dividends.is_empty() {
            dividends.insert_first(self.trade_date - Duration::days(1), 0.0);
        }
        dividends
    }

    pub fn past_index_returns(&self) -> DatedSeries {
        self.index_returns.before(self.trade_date)
    }

    pub fn past_tb_returns(&self) -> DatedSeries {
        self.tb_returns.before(self.trade_date)
    }

    // New views: at or after the trade date, for realizing next-period P&L.

    pub fn new_stock_returns(&self, symbol: &str) -> DatedSeries {
        self.stock_returns
            .get(symbol)
            .map(|s| s.from_date(self.trade_date))
            .unwrap_or_default()
    }

    pub fn new_stock_returns_for(
        &self,
        symbols: &BTreeSet<String>,
    ) -> HashMap<String, DatedSeries> {
        symbols
            .iter()
            .map(|s| (s.clone(), self.new_stock_returns(s)))
            .collect()
    }

    pub fn new_index_returns(&self) -> DatedSeries {
        self.index_returns.from_date(self.trade_date)
    }

    // Latest known fundamentals at or before the trade date. These feed an
    // optional valuation adjustment, so absence is 0.0 rather than an error.

    pub fn latest_dividend(&self, symbol: &str) -> f64 {
        self.latest_fundamental(&self.stock_dividends, symbol)
    }

    pub fn latest_return_on_equity(&self, symbol: &str) -> f64 {
        self.latest_fundamental(&self.stock_roe, symbol)
    }

    pub fn latest_payout_ratio(&self, symbol: &str) -> f64 {
        self.latest_fundamental(&self.stock_payout_ratio, symbol)
    }

    fn latest_fundamental(&self, series: &HashMap<String, DatedSeries>, symbol: &str) -> f64 {
        series
            .get(symbol)
            .and_then(|s| s.latest_at(self.trade_date))
            .map(|(_, v)| v)
            .unwrap_or(0.0)
    }

    // Regression cache.

    /// Fit the symbol's past returns against the past index returns and
    /// cache the result, replacing any earlier fit.
    pub fn compute_stock_regression_result(&mut self, symbol: &str) -> Result<(), TbtraderError> {
        let stats = regression::regress(
            symbol,
            &self.past_stock_returns(symbol),
            &self.past_index_returns(),
        )?;
        self.regression_results.insert(symbol.to_string(), stats);
        Ok(())
    }

    /// Refit every universe symbol against the current trade date.
    pub fn recompute_regressions(&mut self) -> Result<(), TbtraderError> {
        let symbols: Vec<String> = self.symbols.iter().cloned().collect();
        for symbol in symbols {
            self.compute_stock_regression_result(&symbol)?;
        }
        Ok(())
    }

    pub fn stock_regression_results(
        &self,
        symbol: &str,
    ) -> Result<&RegressionStats, TbtraderError> {
        self.regression_results
            .get(symbol)
            .ok_or_else(|| TbtraderError::NoRegressionResults {
                symbol: symbol.to_string(),
            })
    }

    pub fn regression_results_for(
        &self,
        symbols: &BTreeSet<String>,
    ) -> Result<HashMap<String, RegressionStats>, TbtraderError> {
        symbols
            .iter()
            .map(|s| self.stock_regression_results(s).map(|r| (s.clone(), *r)))
            .collect()
    }

    /// Advance the trade date by one calendar day. This moves the clock
    /// only: cached regression results keep reflecting the previous date
    /// until [`recompute_regressions`](Self::recompute_regressions) or
    /// [`compute_stock_regression_result`](Self::compute_stock_regression_result)
    /// is called.
    pub fn increment(&mut self) {
        self.trade_date += Duration::days(1);
    }
}
