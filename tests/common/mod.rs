#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use tbtrader::domain::error::TbtraderError;
use tbtrader::domain::series::DatedSeries;
use tbtrader::ports::data_port::DataSource;
use tbtrader::ports::execution_port::ExecutionPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory data source for integration tests. The index drifts upward a
/// few basis points a day; stocks are built per test with the helpers below.
pub struct MockDataSource {
    pub index: DatedSeries,
    pub tbills: DatedSeries,
    pub prices: HashMap<String, DatedSeries>,
    pub dividends: HashMap<String, DatedSeries>,
    pub roe: HashMap<String, DatedSeries>,
    pub payout: HashMap<String, DatedSeries>,
}

impl MockDataSource {
    pub fn new(start: NaiveDate, days: usize) -> Self {
        let index = DatedSeries::from_pairs((0..days).map(|i| {
            let wave = ((i % 13) as f64 - 6.0) * 1e-4;
            let level = 3000.0 * 1.0005_f64.powi(i as i32) * (1.0 + wave);
            (start + Duration::days(i as i64), level)
        }));
        let tbills = DatedSeries::from_pairs(
            (0..days)
                .step_by(7)
                .map(|i| (start + Duration::days(i as i64), 1.06)),
        );
        Self {
            index,
            tbills,
            prices: HashMap::new(),
            dividends: HashMap::new(),
            roe: HashMap::new(),
            payout: HashMap::new(),
        }
    }

    /// A stock that co-moves with the index and drifts upward on its own.
    pub fn add_rising_stock(&mut self, symbol: &str, shift: usize) -> &mut Self {
        self.add_coupled_stock(symbol, 0.0002, shift)
    }

    /// A stock with a steady negative drift against the rising index, so a
    /// fit over any window produces a negative alpha.
    pub fn add_declining_stock(&mut self, symbol: &str, shift: usize) -> &mut Self {
        self.add_coupled_stock(symbol, -0.0003, shift)
    }

    fn add_coupled_stock(&mut self, symbol: &str, drift: f64, shift: usize) -> &mut Self {
        let index_returns = self.index.to_returns();
        let mut price = 100.0;
        let series = DatedSeries::from_pairs(self.index.iter().enumerate().map(|(i, (d, _))| {
            if i > 0 {
                let market = index_returns.get(d).unwrap_or(0.0);
                let noise = (((i * (shift + 3)) % 19) as f64 - 9.0) * 0.002;
                price *= 1.0 + drift + 0.3 * market + noise;
            }
            (d, price)
        }));
        self.prices.insert(symbol.to_string(), series);
        self
    }

    /// A stock whose price history starts before the index history, leaving
    /// a return date the index cannot match.
    pub fn add_misaligned_stock(&mut self, symbol: &str, days: usize) -> &mut Self {
        let start = self.index.first().map(|(d, _)| d).unwrap() - Duration::days(1);
        let series = DatedSeries::from_pairs(
            (0..days).map(|i| (start + Duration::days(i as i64), 100.0 + i as f64 * 0.01)),
        );
        self.prices.insert(symbol.to_string(), series);
        self
    }

    pub fn set_fundamentals(&mut self, symbol: &str, on: NaiveDate, roe: f64, payout: f64) {
        self.roe
            .insert(symbol.to_string(), DatedSeries::from_pairs([(on, roe)]));
        self.payout
            .insert(symbol.to_string(), DatedSeries::from_pairs([(on, payout)]));
    }

    pub fn set_dividend(&mut self, symbol: &str, on: NaiveDate, amount: f64) {
        self.dividends
            .insert(symbol.to_string(), DatedSeries::from_pairs([(on, amount)]));
    }

    fn select(
        map: &HashMap<String, DatedSeries>,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> HashMap<String, DatedSeries> {
        symbols
            .iter()
            .map(|s| {
                let series = map
                    .get(s)
                    .map(|series| clamp(series, from, to))
                    .unwrap_or_default();
                (s.clone(), series)
            })
            .collect()
    }
}

fn clamp(series: &DatedSeries, from: NaiveDate, to: NaiveDate) -> DatedSeries {
    series.from_date(from).before(to + Duration::days(1))
}

impl DataSource for MockDataSource {
    fn list_symbols(&self) -> Result<Vec<String>, TbtraderError> {
        Ok(self.prices.keys().cloned().collect())
    }

    fn index_prices(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError> {
        Ok(clamp(&self.index, from, to))
    }

    fn tbill_returns(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError> {
        Ok(clamp(&self.tbills, from, to))
    }

    fn stock_prices(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        Ok(Self::select(&self.prices, symbols, from, to))
    }

    fn stock_dividends(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        Ok(Self::select(&self.dividends, symbols, from, to))
    }

    fn stock_return_on_equity(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        Ok(Self::select(&self.roe, symbols, from, to))
    }

    fn stock_payout_ratios(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        Ok(Self::select(&self.payout, symbols, from, to))
    }
}

/// Quote port with fixed prices.
pub struct FixedQuotes(pub HashMap<String, f64>);

impl FixedQuotes {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        Self(prices.iter().map(|(s, p)| (s.to_string(), *p)).collect())
    }
}

impl ExecutionPort for FixedQuotes {
    fn latest_price(&self, symbol: &str) -> Result<Option<f64>, TbtraderError> {
        Ok(self.0.get(symbol).copied())
    }
}

/// Quote port that forces exactly one exclusion per optimization attempt.
///
/// Quotes an absurd price for one designated victim per attempt so its
/// whole-share rounding collapses to zero and it gets dropped; every other
/// symbol gets no quote, which leaves its weight untouched. Attempts are
/// recognized by query count: every attempt queries each working symbol
/// exactly once, and the working set shrinks by one victim per attempt.
pub struct AttemptVictimQuotes {
    victims: Vec<String>,
    attempt_end: Vec<usize>,
    calls: RefCell<usize>,
}

impl AttemptVictimQuotes {
    pub fn new(universe_size: usize, victims: &[&str]) -> Self {
        let mut attempt_end = Vec::with_capacity(victims.len());
        let mut total = 0;
        for i in 0..victims.len() {
            total += universe_size - i;
            attempt_end.push(total);
        }
        Self {
            victims: victims.iter().map(|s| s.to_string()).collect(),
            attempt_end,
            calls: RefCell::new(0),
        }
    }
}

impl ExecutionPort for AttemptVictimQuotes {
    fn latest_price(&self, symbol: &str) -> Result<Option<f64>, TbtraderError> {
        let mut calls = self.calls.borrow_mut();
        *calls += 1;
        let attempt = self
            .attempt_end
            .iter()
            .position(|&end| *calls <= end)
            .unwrap_or(self.victims.len() - 1);
        if self.victims[attempt] == symbol {
            Ok(Some(1.0e9))
        } else {
            Ok(None)
        }
    }
}
