//! In-memory quote source.

use crate::domain::error::TbtraderError;
use crate::ports::execution_port::ExecutionPort;
use std::collections::HashMap;

/// Serves latest prices from a fixed map. The CLI seeds it with each
/// symbol's most recent past price; tests seed it directly.
#[derive(Debug, Default)]
pub struct StaticQuotes {
    prices: HashMap<String, f64>,
}

impl StaticQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn set_price(&mut self, symbol: &str, price: f64) {
        self.prices.insert(symbol.to_string(), price);
    }
}

impl ExecutionPort for StaticQuotes {
    fn latest_price(&self, symbol: &str) -> Result<Option<f64>, TbtraderError> {
        Ok(self.prices.get(symbol).copied())
    }
}
