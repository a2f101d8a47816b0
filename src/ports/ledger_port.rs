//! Closed-trade persistence port trait.

use crate::domain::error::EngineError;
use crate::domain::position::ClosedTrade;

/// Port for persisting closed trades.
pub trait LedgerPort {
    /// Append `trades` to the store. Earlier records are left untouched.
    fn persist(&mut self, trades: &[ClosedTrade]) -> Result<(), EngineError>;
}
