//! Concrete adapter implementations for ports.

pub mod csv_ledger;
pub mod csv_tick_feed;
pub mod file_config_adapter;
pub mod simulated_feed;
