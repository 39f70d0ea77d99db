//! Fail-fast validation of backtest configuration.

use crate::domain::error::TbtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TbtraderError> {
    config
        .get_string(section, key)
        .ok_or_else(|| TbtraderError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, TbtraderError> {
    let raw = require(config, section, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| TbtraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

/// Check the keys every subcommand needs before touching any data.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TbtraderError> {
    require(config, "data", "path")?;
    let from = parse_date(config, "backtest", "from")?;
    let start = parse_date(config, "backtest", "start_date")?;
    let end = parse_date(config, "backtest", "end_date")?;

    if start < from {
        return Err(TbtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "start_date is before the data window".into(),
        });
    }
    if end < start {
        return Err(TbtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "end_date is before start_date".into(),
        });
    }

    let max_adjustment = config.get_double("backtest", "max_adjustment", 0.2);
    if !(0.0..=1.0).contains(&max_adjustment) {
        return Err(TbtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "max_adjustment".into(),
            reason: "must be between 0 and 1".into(),
        });
    }

    let initial_capital = config.get_double("backtest", "initial_capital", 100_000.0);
    if initial_capital <= 0.0 {
        return Err(TbtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "initial_capital".into(),
            reason: "must be positive".into(),
        });
    }

    Ok(())
}
