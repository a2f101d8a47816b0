//! Account state: balance, open positions and trade history.

use super::ledger::Ledger;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub balance: f64,
    pub initial_balance: f64,
    pub open_positions: Vec<Position>,
    pub history: Ledger,
    next_position_id: u64,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Account {
            balance: initial_balance,
            initial_balance,
            open_positions: Vec::new(),
            history: Ledger::new(),
            next_position_id: 1,
        }
    }

    /// Hand out the id for the next position opened on this account.
    pub fn allocate_position_id(&mut self) -> u64 {
        let id = self.next_position_id;
        self.next_position_id += 1;
        id
    }

    pub fn add_position(&mut self, position: Position) {
        self.open_positions.push(position);
    }

    pub fn get_position(&self, id: u64) -> Option<&Position> {
        self.open_positions.iter().find(|p| p.id == id)
    }

    pub fn position_count(&self) -> usize {
        self.open_positions.len()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.history.record(trade);
    }

    /// Notional currently reserved by open longs.
    pub fn reserved_capital(&self) -> f64 {
        self.open_positions
            .iter()
            .map(|p| p.returned_notional(p.amount))
            .sum()
    }

    /// Balance plus reserved notional plus unrealized profit at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        let unrealized: f64 = self
            .open_positions
            .iter()
            .map(|p| p.unrealized_pnl(price))
            .sum();
        self.balance + self.reserved_capital() + unrealized
    }
}
