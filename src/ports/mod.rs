//! Port traits implemented by adapters and test doubles.

pub mod data_port;
pub mod execution_port;
pub mod config_port;
