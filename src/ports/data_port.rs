//! Market data access port.

use crate::domain::error::TbtraderError;
use crate::domain::series::DatedSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Capability interface over a market data backend. The repository is
/// composed over an injected implementation; each method returns raw series
/// restricted to `[from, to]`.
pub trait DataSource {
    fn list_symbols(&self) -> Result<Vec<String>, TbtraderError>;

    fn index_prices(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError>;

    /// Short-term T-bill returns, quoted in percent.
    fn tbill_returns(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError>;

    fn stock_prices(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError>;

    fn stock_dividends(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError>;

    fn stock_return_on_equity(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError>;

    fn stock_payout_ratios(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError>;
}
