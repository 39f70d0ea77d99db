//! CSV directory data source.
//!
//! Layout under the base path:
//!   symbols.txt            one symbol per line
//!   index.csv              date,close
//!   tbill.csv              date,rate (percent)
//!   prices/<SYM>.csv       date,close
//!   dividends/<SYM>.csv    date,amount
//!   roe/<SYM>.csv          date,ratio
//!   payout/<SYM>.csv       date,ratio
//!
//! Price files are required per symbol; fundamentals files are optional and
//! absence yields an empty series. NaN rows are skipped and duplicate dates
//! keep the first value seen.

use crate::domain::error::TbtraderError;
use crate::domain::series::DatedSeries;
use crate::ports::data_port::DataSource;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvDataSource {
    base_path: PathBuf,
}

impl CsvDataSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_series(
        path: &Path,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DatedSeries, TbtraderError> {
        let content = fs::read_to_string(path).map_err(|e| TbtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut series = DatedSeries::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TbtraderError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let Some(date_str) = record.get(0) else {
                continue;
            };
            // Tolerate a header row or stray lines without a value column.
            let Ok(date) = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") else {
                continue;
            };
            let Some(value_str) = record.get(1) else {
                eprintln!("warning: no value in line, ignoring: {date_str}");
                continue;
            };
            let value: f64 = value_str
                .trim()
                .parse()
                .map_err(|e| TbtraderError::DataSource {
                    reason: format!("invalid value for {date} in {}: {e}", path.display()),
                })?;

            if date < from || date > to {
                continue;
            }
            series.insert_first(date, value);
        }

        Ok(series)
    }

    /// Per-symbol series from `dir/<SYM>.csv`; a missing file is an empty
    /// series when `optional`, an error otherwise.
    fn read_symbol_series(
        &self,
        dir: &str,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
        optional: bool,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        let mut map = HashMap::new();
        for symbol in symbols {
            let path = self.base_path.join(dir).join(format!("{symbol}.csv"));
            let series = if path.exists() {
                Self::read_series(&path, from, to)?
            } else if optional {
                DatedSeries::new()
            } else {
                return Err(TbtraderError::DataSource {
                    reason: format!("missing price file {}", path.display()),
                });
            };
            map.insert(symbol.clone(), series);
        }
        Ok(map)
    }
}

impl DataSource for CsvDataSource {
    fn list_symbols(&self) -> Result<Vec<String>, TbtraderError> {
        let path = self.base_path.join("symbols.txt");
        let content = fs::read_to_string(&path).map_err(|e| TbtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut symbols: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    fn index_prices(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError> {
        Self::read_series(&self.base_path.join("index.csv"), from, to)
    }

    fn tbill_returns(&self, from: NaiveDate, to: NaiveDate) -> Result<DatedSeries, TbtraderError> {
        Self::read_series(&self.base_path.join("tbill.csv"), from, to)
    }

    fn stock_prices(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        self.read_symbol_series("prices", symbols, from, to, false)
    }

    fn stock_dividends(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        self.read_symbol_series("dividends", symbols, from, to, true)
    }

    fn stock_return_on_equity(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        self.read_symbol_series("roe", symbols, from, to, true)
    }

    fn stock_payout_ratios(
        &self,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DatedSeries>, TbtraderError> {
        self.read_symbol_series("payout", symbols, from, to, true)
    }
}
