//! Per-tick position lifecycle: partial take-profits and final closes.
//!
//! Each open position runs through these checks on every tick, in order:
//! 1. TP50 (stage `Open`): close 50% of the remaining amount
//! 2. TP75 (stage `Partial50`): close 25% of what remains
//! 3. Stop-loss: close everything left, tagged `SL`
//! 4. Otherwise, breakeven (empty amount or price back at entry): close
//!    everything left at zero profit, tagged `Breakeven/TP`
//!
//! One tick can fire both partials and then a final close. Longs get their
//! closed notional back on the balance; shorts only book profit or loss.

use chrono::NaiveDateTime;
use tracing::info;

use super::account::Account;
use super::position::{CloseReason, ClosedTrade, PartialClose, Position, PositionStage};

pub const TP50_CLOSE_FRACTION: f64 = 0.5;
pub const TP75_CLOSE_FRACTION: f64 = 0.25;

/// What happened to the open set on one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleReport {
    pub partials: Vec<PartialClose>,
    pub closed: Vec<ClosedTrade>,
}

/// Close `fraction` of the position's remaining amount and advance its stage.
///
/// Returns the credit owed to the balance alongside the partial event.
fn take_partial(
    position: &mut Position,
    fraction: f64,
    next: PositionStage,
    price: f64,
    time: NaiveDateTime,
) -> (f64, PartialClose) {
    let closed = position.amount * fraction;
    let profit = position.profit(price, closed);
    let credit = profit + position.returned_notional(closed);

    position.amount -= closed;
    position.partial_profit += profit;
    position.stage = next;

    let partial = PartialClose {
        position_id: position.id,
        stage: next,
        time,
        price,
        amount: closed,
        profit,
    };
    (credit, partial)
}

/// Run the final-close checks. Returns the credit and the closed snapshot
/// when the position leaves the open set.
fn try_close(position: &Position, price: f64, time: NaiveDateTime) -> Option<(f64, ClosedTrade)> {
    if position.should_stop_loss(price) {
        let profit = position.unrealized_pnl(price);
        let credit = profit + position.returned_notional(position.amount);
        let trade = ClosedTrade::from_position(position, price, time, profit, CloseReason::StopLoss);
        return Some((credit, trade));
    }

    if position.should_close_breakeven(price) {
        let credit = position.returned_notional(position.amount);
        let trade = ClosedTrade::from_position(
            position,
            price,
            time,
            0.0,
            CloseReason::BreakevenOrTakeProfit,
        );
        return Some((credit, trade));
    }

    None
}

/// Evaluate every open position against `price`.
///
/// Positions are drained and rebuilt rather than removed mid-iteration;
/// survivors keep their relative order.
pub fn update_positions(account: &mut Account, price: f64, time: NaiveDateTime) -> LifecycleReport {
    let mut report = LifecycleReport::default();
    let positions = std::mem::take(&mut account.open_positions);
    let mut survivors = Vec::with_capacity(positions.len());

    for mut position in positions {
        if position.should_take_profit_50(price) {
            let (credit, partial) = take_partial(
                &mut position,
                TP50_CLOSE_FRACTION,
                PositionStage::Partial50,
                price,
                time,
            );
            account.balance += credit;
            info!(
                id = position.id,
                stage = %partial.stage,
                price,
                amount = partial.amount,
                profit = partial.profit,
                "take-profit hit"
            );
            report.partials.push(partial);
        }

        if position.should_take_profit_75(price) {
            let (credit, partial) = take_partial(
                &mut position,
                TP75_CLOSE_FRACTION,
                PositionStage::Partial75,
                price,
                time,
            );
            account.balance += credit;
            info!(
                id = position.id,
                stage = %partial.stage,
                price,
                amount = partial.amount,
                profit = partial.profit,
                "take-profit hit"
            );
            report.partials.push(partial);
        }

        match try_close(&position, price, time) {
            Some((credit, trade)) => {
                account.balance += credit;
                info!(
                    id = trade.position_id,
                    reason = %trade.close_reason,
                    price,
                    amount = trade.amount,
                    profit = trade.profit,
                    "position closed"
                );
                account.record_trade(trade.clone());
                report.closed.push(trade);
            }
            None => survivors.push(position),
        }
    }

    account.open_positions = survivors;
    report
}
