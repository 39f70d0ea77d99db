//! Execution venue port.

use crate::domain::error::TbtraderError;

/// The one thing the core needs from the execution venue: the latest
/// tradable price, used by the fractional-share adjustment step. `None`
/// means no quote is currently available for the symbol.
pub trait ExecutionPort {
    fn latest_price(&self, symbol: &str) -> Result<Option<f64>, TbtraderError>;
}
