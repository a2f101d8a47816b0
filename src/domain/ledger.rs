//! Append-only record of closed trades.

use super::position::{CloseReason, ClosedTrade};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    trades: Vec<ClosedTrade>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger { trades: Vec::new() }
    }

    pub fn record(&mut self, trade: ClosedTrade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary::compute(&self.trades)
    }
}

/// Win/loss tallies over a set of closed trades.
///
/// Wins and losses are judged on each trade's final-step profit, matching
/// `ClosedTrade::is_winner`; `total_profit` includes partial closes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerSummary {
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub breakeven: usize,
    pub stop_losses: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl LedgerSummary {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        let mut summary = LedgerSummary {
            total_trades: trades.len(),
            ..Default::default()
        };

        for trade in trades {
            if trade.profit > 0.0 {
                summary.winners += 1;
                summary.largest_win = summary.largest_win.max(trade.profit);
            } else if trade.profit < 0.0 {
                summary.losers += 1;
                summary.largest_loss = summary.largest_loss.max(trade.profit.abs());
            } else {
                summary.breakeven += 1;
            }
            if trade.close_reason == CloseReason::StopLoss {
                summary.stop_losses += 1;
            }
            summary.total_profit += trade.total_profit();
        }

        summary.win_rate = if summary.total_trades > 0 {
            summary.winners as f64 / summary.total_trades as f64
        } else {
            0.0
        };

        summary
    }
}
