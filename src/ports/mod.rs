//! Port traits the domain depends on; adapters implement them.

pub mod config_port;
pub mod tick_feed;
pub mod ledger_port;
