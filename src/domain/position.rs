//! Position tracking and closed-trade snapshots.

use chrono::NaiveDateTime;
use std::fmt;

use super::market::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn from_trend(trend: Trend) -> Self {
        match trend {
            Trend::Up => Direction::Long,
            Trend::Down => Direction::Short,
        }
    }

    /// Longs pay their notional up front and get it back as they close.
    /// Shorts carry no reservation: only their profit or loss touches the
    /// balance.
    pub fn reserves_capital(self) -> bool {
        matches!(self, Direction::Long)
    }

    /// True once `price` has moved to or past `target` in the profitable
    /// direction.
    pub fn reached(self, price: f64, target: f64) -> bool {
        match self {
            Direction::Long => price >= target,
            Direction::Short => price <= target,
        }
    }

    /// True once `price` has moved to or past `stop` against the position.
    pub fn stopped(self, price: f64, stop: f64) -> bool {
        match self {
            Direction::Long => price <= stop,
            Direction::Short => price >= stop,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// How far through the take-profit ladder a position has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStage {
    Open,
    Partial50,
    Partial75,
}

impl fmt::Display for PositionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStage::Open => write!(f, "OPEN"),
            PositionStage::Partial50 => write!(f, "PARTIAL_50"),
            PositionStage::Partial75 => write!(f, "PARTIAL_75"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: u64,
    pub direction: Direction,
    pub entry_price: f64,
    /// Remaining notional.
    pub amount: f64,
    pub initial_amount: f64,
    pub stop_loss: f64,
    pub take_profit_50: f64,
    pub take_profit_75: f64,
    pub open_time: NaiveDateTime,
    pub score: u32,
    pub reason: String,
    pub stage: PositionStage,
    /// Profit realized so far by partial closes.
    pub partial_profit: f64,
}

impl Position {
    /// Profit from closing `amount` of this position at `price`.
    pub fn profit(&self, price: f64, amount: f64) -> f64 {
        match self.direction {
            Direction::Long => (price - self.entry_price) * amount,
            Direction::Short => (self.entry_price - price) * amount,
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.profit(price, self.amount)
    }

    /// Notional handed back to the balance when `amount` is closed.
    pub fn returned_notional(&self, amount: f64) -> f64 {
        if self.direction.reserves_capital() {
            amount
        } else {
            0.0
        }
    }

    pub fn should_take_profit_50(&self, price: f64) -> bool {
        self.stage == PositionStage::Open && self.direction.reached(price, self.take_profit_50)
    }

    pub fn should_take_profit_75(&self, price: f64) -> bool {
        self.stage == PositionStage::Partial50 && self.direction.reached(price, self.take_profit_75)
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.direction.stopped(price, self.stop_loss)
    }

    pub fn should_close_breakeven(&self, price: f64) -> bool {
        self.amount <= 0.0 || price == self.entry_price
    }
}

/// A take-profit stage firing on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialClose {
    pub position_id: u64,
    pub stage: PositionStage,
    pub time: NaiveDateTime,
    pub price: f64,
    pub amount: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    StopLoss,
    BreakevenOrTakeProfit,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "SL"),
            CloseReason::BreakevenOrTakeProfit => write!(f, "Breakeven/TP"),
        }
    }
}

/// Snapshot of a position at the moment it left the open set.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub position_id: u64,
    pub direction: Direction,
    pub open_time: NaiveDateTime,
    pub close_time: NaiveDateTime,
    pub entry_price: f64,
    pub close_price: f64,
    /// Amount closed by the final step.
    pub amount: f64,
    pub initial_amount: f64,
    pub stop_loss: f64,
    pub take_profit_50: f64,
    pub take_profit_75: f64,
    /// Profit of the final step only.
    pub profit: f64,
    pub partial_profit: f64,
    pub is_winner: bool,
    pub close_reason: CloseReason,
    pub entry_reason: String,
}

impl ClosedTrade {
    pub fn from_position(
        position: &Position,
        close_price: f64,
        close_time: NaiveDateTime,
        profit: f64,
        close_reason: CloseReason,
    ) -> Self {
        ClosedTrade {
            position_id: position.id,
            direction: position.direction,
            open_time: position.open_time,
            close_time,
            entry_price: position.entry_price,
            close_price,
            amount: position.amount,
            initial_amount: position.initial_amount,
            stop_loss: position.stop_loss,
            take_profit_50: position.take_profit_50,
            take_profit_75: position.take_profit_75,
            profit,
            partial_profit: position.partial_profit,
            is_winner: profit > 0.0,
            close_reason,
            entry_reason: position.reason.clone(),
        }
    }

    /// Final-step profit plus everything realized by partial closes.
    pub fn total_profit(&self) -> f64 {
        self.profit + self.partial_profit
    }
}
