//! tbtrader — fundamental equity selection and Treynor-Black portfolio
//! construction over a point-in-time market data repository.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
