//! CSV closed-trade ledger adapter.
//!
//! Rows are appended; the header is written only when the file is new or
//! empty, so repeated runs extend the same ledger.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::adapters::csv_tick_feed::TIME_FORMAT;
use crate::domain::error::EngineError;
use crate::domain::position::ClosedTrade;
use crate::ports::ledger_port::LedgerPort;

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    position_id: u64,
    direction: String,
    open_time: String,
    close_time: String,
    entry_price: f64,
    close_price: f64,
    amount: f64,
    initial_amount: f64,
    stop_loss: f64,
    take_profit_50: f64,
    take_profit_75: f64,
    profit: f64,
    partial_profit: f64,
    is_winner: bool,
    close_reason: String,
    entry_reason: &'a str,
}

impl<'a> From<&'a ClosedTrade> for LedgerRow<'a> {
    fn from(t: &'a ClosedTrade) -> Self {
        LedgerRow {
            position_id: t.position_id,
            direction: t.direction.to_string(),
            open_time: t.open_time.format(TIME_FORMAT).to_string(),
            close_time: t.close_time.format(TIME_FORMAT).to_string(),
            entry_price: t.entry_price,
            close_price: t.close_price,
            amount: t.amount,
            initial_amount: t.initial_amount,
            stop_loss: t.stop_loss,
            take_profit_50: t.take_profit_50,
            take_profit_75: t.take_profit_75,
            profit: t.profit,
            partial_profit: t.partial_profit,
            is_winner: t.is_winner,
            close_reason: t.close_reason.to_string(),
            entry_reason: &t.entry_reason,
        }
    }
}

pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ledger_err(&self, e: impl std::fmt::Display) -> EngineError {
        EngineError::Ledger {
            reason: format!("{}: {e}", self.path.display()),
        }
    }
}

impl LedgerPort for CsvLedger {
    fn persist(&mut self, trades: &[ClosedTrade]) -> Result<(), EngineError> {
        if trades.is_empty() {
            return Ok(());
        }

        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.ledger_err(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for trade in trades {
            writer
                .serialize(LedgerRow::from(trade))
                .map_err(|e| self.ledger_err(e))?;
        }
        writer.flush().map_err(|e| self.ledger_err(e))?;
        Ok(())
    }
}
