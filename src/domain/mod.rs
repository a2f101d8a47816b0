//! Core domain types and logic: market data, scoring, entries, the position
//! lifecycle and the engine that ties them together.

pub mod market;
pub mod fibonacci;
pub mod scoring;
pub mod position;
pub mod account;
pub mod ledger;
pub mod entry;
pub mod lifecycle;
pub mod config;
pub mod engine;
pub mod runner;
pub mod error;
