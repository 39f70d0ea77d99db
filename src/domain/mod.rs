//! Core domain types and logic.

pub mod series;
pub mod error;
pub mod regression;
pub mod repository;
pub mod capm;
pub mod screener;
pub mod optimizer;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
