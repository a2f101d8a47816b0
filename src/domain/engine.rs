//! Tick processing.
//!
//! One tick runs, in order: price check, range validation, scoring, entry
//! planning, lifecycle evaluation. A tick with an unusable price is rejected
//! before anything is touched. Entry-level problems (bad range, no zone, no
//! capital) skip the entry only; open positions are still evaluated.

use tracing::{debug, info, warn};

use super::account::Account;
use super::config::EngineConfig;
use super::entry::{self, EntryPlan};
use super::error::EngineError;
use super::lifecycle::{self, LifecycleReport};
use super::market::Tick;
use super::position::{ClosedTrade, PartialClose, Position};
use super::scoring::{self, ScoreBreakdown};

/// Everything a single tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// `None` when the ranges were invalid and scoring was skipped.
    pub score: Option<ScoreBreakdown>,
    pub opened: Option<Position>,
    pub entry_rejection: Option<EngineError>,
    pub partials: Vec<PartialClose>,
    pub closed: Vec<ClosedTrade>,
    pub balance: f64,
    pub open_positions: usize,
}

impl TickOutcome {
    pub fn score_total(&self) -> u32 {
        self.score.as_ref().map(ScoreBreakdown::total).unwrap_or(0)
    }
}

/// One symbol's engine: configuration plus the account it trades.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    account: Account,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let account = Account::new(config.initial_balance);
        Engine { config, account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn balance(&self) -> f64 {
        self.account.balance
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.account.open_positions
    }

    pub fn history(&self) -> &[ClosedTrade] {
        self.account.history.trades()
    }

    /// Score the tick and, if it qualifies, work out the entry.
    fn evaluate_entry(
        &self,
        tick: &Tick,
    ) -> (Option<ScoreBreakdown>, Result<Option<EntryPlan>, EngineError>) {
        if let Err(e) = tick.timeframes.validate() {
            return (None, Err(e));
        }

        let breakdown = scoring::score_breakdown(
            tick.price,
            &tick.timeframes,
            &tick.rsi,
            &tick.macd,
            &self.config.rsi,
        );
        debug!(
            time = %tick.time,
            price = tick.price,
            score = breakdown.total(),
            zones = breakdown.zone_points(),
            divergence = breakdown.divergence_points,
            rsi = breakdown.rsi_points,
            "scored tick"
        );

        let plan = entry::plan(
            breakdown.total(),
            tick.trend,
            &tick.timeframes,
            tick.price,
            self.account.balance,
            tick.time,
            &self.config.entry,
        );
        (Some(breakdown), plan)
    }

    /// Open `plan` and return a snapshot of the position as opened.
    fn open(&mut self, plan: EntryPlan) -> Position {
        info!(
            time = %plan.time,
            direction = %plan.direction,
            price = plan.entry_price,
            amount = plan.amount,
            fraction = plan.capital_fraction,
            stop_loss = plan.stop_loss,
            tp50 = plan.take_profit_50,
            tp75 = plan.take_profit_75,
            matched = %plan.matched,
            "opening position"
        );
        let position = entry::build_position(self.account.allocate_position_id(), plan);
        let snapshot = position.clone();
        entry::open_position(&mut self.account, position);
        snapshot
    }

    pub fn process_tick(&mut self, tick: &Tick) -> Result<TickOutcome, EngineError> {
        if !tick.price.is_finite() || tick.price <= 0.0 {
            warn!(time = %tick.time, price = tick.price, "rejected tick");
            return Err(EngineError::InvalidPrice { price: tick.price });
        }

        let (score, plan) = self.evaluate_entry(tick);

        let mut pending = None;
        let mut entry_rejection = None;
        match plan {
            Ok(plan) => pending = plan,
            Err(e) => {
                warn!(time = %tick.time, error = %e, "entry skipped");
                entry_rejection = Some(e);
            }
        }

        let mut opened = None;
        if self.config.settle_on_entry_tick {
            opened = pending.take().map(|plan| self.open(plan));
        }

        let LifecycleReport { partials, closed } =
            lifecycle::update_positions(&mut self.account, tick.price, tick.time);

        // Closes on this tick may have moved the balance the plan was sized from.
        if let Some(plan) = pending {
            match plan.resized(self.account.balance) {
                Ok(plan) => opened = Some(self.open(plan)),
                Err(e) => {
                    warn!(time = %tick.time, error = %e, "entry skipped");
                    entry_rejection = Some(e);
                }
            }
        }

        Ok(TickOutcome {
            score,
            opened,
            entry_rejection,
            partials,
            closed,
            balance: self.account.balance,
            open_positions: self.account.position_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{Macd, Range, Rsi, Timeframe, Timeframes, Trend};
    use crate::domain::position::{CloseReason, Direction, PositionStage};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn time(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn tick(price: f64, trend: Trend, rsi: Rsi) -> Tick {
        Tick {
            time: time(0),
            price,
            trend,
            timeframes: Timeframes {
                two_week: Range::new(100.0, 150.0),
                one_week: Range::new(110.0, 145.0),
                four_day: Range::new(120.0, 140.0),
            },
            rsi,
            macd: Macd { divergence: false },
        }
    }

    fn deferred() -> EngineConfig {
        EngineConfig {
            settle_on_entry_tick: false,
            ..Default::default()
        }
    }

    fn overbought(value: f64) -> Rsi {
        Rsi {
            value,
            divergence: true,
            overbought: true,
            oversold: false,
        }
    }

    #[test]
    fn score_three_opens_nothing() {
        let mut engine = Engine::new(EngineConfig::default());
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Up, overbought(70.0)))
            .unwrap();

        assert_eq!(outcome.score_total(), 3);
        assert!(outcome.opened.is_none());
        assert!(outcome.entry_rejection.is_none());
        assert_relative_eq!(outcome.balance, 10_000.0);
    }

    #[test]
    fn score_four_opens_long_with_one_week_stop() {
        let mut engine = Engine::new(EngineConfig::default());
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Up, overbought(10.0)))
            .unwrap();

        assert_eq!(outcome.score_total(), 4);
        let opened = outcome.opened.expect("position should open");
        assert_eq!(opened.direction, Direction::Long);
        assert_relative_eq!(opened.stop_loss, 145.0);
        assert_relative_eq!(opened.amount, 4_000.0, epsilon = 1e-9);
    }

    #[test]
    fn long_entry_above_targets_closes_on_same_tick() {
        // Long targets are taken from the range anchored at its high, so at
        // 136 both take-profits (127.5, 118.75) and the 145 stop are already
        // reached: the position walks through every stage immediately.
        let mut engine = Engine::new(EngineConfig::default());
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Up, overbought(10.0)))
            .unwrap();

        assert_eq!(outcome.partials.len(), 2);
        assert_eq!(outcome.closed.len(), 1);
        assert_eq!(outcome.closed[0].close_reason, CloseReason::StopLoss);
        assert_eq!(outcome.closed[0].profit, 0.0);
        assert_eq!(outcome.open_positions, 0);
        assert_relative_eq!(engine.balance(), 10_000.0, epsilon = 1e-9);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn short_entry_closes_at_breakeven_on_entry_tick() {
        let mut engine = Engine::new(EngineConfig::default());
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();

        assert_eq!(outcome.opened.unwrap().direction, Direction::Short);
        assert!(outcome.partials.is_empty());
        assert_eq!(outcome.closed.len(), 1);
        assert_eq!(
            outcome.closed[0].close_reason,
            CloseReason::BreakevenOrTakeProfit
        );
        assert_relative_eq!(engine.balance(), 10_000.0);
    }

    #[test]
    fn deferred_entry_stays_open_until_next_tick() {
        let mut engine = Engine::new(deferred());
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();

        assert!(outcome.opened.is_some());
        assert!(outcome.closed.is_empty());
        assert_eq!(outcome.open_positions, 1);
        assert_eq!(engine.open_positions()[0].stage, PositionStage::Open);
    }

    #[test]
    fn deferred_entry_rejected_when_same_tick_stop_empties_balance() {
        let mut engine = Engine::new(deferred());
        engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();

        let mut t = tick(146.0, Trend::Up, overbought(10.0));
        t.timeframes.one_week = Range::new(110.0, 160.0);
        let outcome = engine.process_tick(&t).unwrap();

        // short: (136 - 146) * 4000
        assert_eq!(outcome.closed.len(), 1);
        assert_eq!(outcome.closed[0].close_reason, CloseReason::StopLoss);
        assert!(outcome.opened.is_none());
        assert!(matches!(
            outcome.entry_rejection,
            Some(EngineError::NonPositiveBalance { .. })
        ));
        assert_relative_eq!(engine.balance(), 10_000.0 - 40_000.0, epsilon = 1e-6);
        assert!(engine.open_positions().is_empty());
    }

    #[test]
    fn deferred_entry_sized_from_balance_after_closes() {
        let mut engine = Engine::new(deferred());
        engine
            .process_tick(&tick(136.0, Trend::Up, overbought(10.0)))
            .unwrap();
        assert_relative_eq!(engine.balance(), 6_000.0, epsilon = 1e-9);

        // The long walks through every stage at 136 and returns its 4000
        // before the short is sized.
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();
        assert_eq!(outcome.closed.len(), 1);
        let opened = outcome.opened.expect("short should open");
        assert_eq!(opened.direction, Direction::Short);
        assert_relative_eq!(opened.amount, 4_000.0, epsilon = 1e-9);
        assert_relative_eq!(engine.balance(), 10_000.0, epsilon = 1e-9);
    }

    #[test]
    fn short_walks_through_targets_to_stop() {
        let mut engine = Engine::new(deferred());
        engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();
        let quiet = Rsi::default();

        let outcome = engine.process_tick(&tick(127.0, Trend::Down, quiet)).unwrap();
        // tp50 at 127.5 and tp75 at 136.25 are both reached for a short at 127
        assert_eq!(outcome.partials.len(), 2);
        let remaining = engine.open_positions()[0].amount;
        assert_relative_eq!(remaining, 4_000.0 * 0.5 * 0.75, epsilon = 1e-9);
        // 9 points on 2000, then 9 points on 500
        assert_relative_eq!(engine.balance(), 10_000.0 + 18_000.0 + 4_500.0, epsilon = 1e-6);

        let outcome = engine.process_tick(&tick(146.0, Trend::Down, quiet)).unwrap();
        assert_eq!(outcome.closed.len(), 1);
        assert_eq!(outcome.closed[0].close_reason, CloseReason::StopLoss);
        assert!(engine.open_positions().is_empty());
    }

    #[test]
    fn invalid_price_rejects_tick_without_mutation() {
        let mut engine = Engine::new(deferred());
        engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();
        let before = engine.account().clone();

        let err = engine
            .process_tick(&tick(f64::NAN, Trend::Down, overbought(10.0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPrice { .. }));
        assert_eq!(engine.account(), &before);

        let err = engine
            .process_tick(&tick(-1.0, Trend::Down, overbought(10.0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPrice { .. }));
    }

    #[test]
    fn invalid_range_skips_entry_but_evaluates_positions() {
        let mut engine = Engine::new(deferred());
        engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();

        let mut bad = tick(150.0, Trend::Down, overbought(10.0));
        bad.timeframes.four_day = Range::new(140.0, 120.0);
        let outcome = engine.process_tick(&bad).unwrap();

        assert!(outcome.score.is_none());
        assert!(matches!(
            outcome.entry_rejection,
            Some(EngineError::InvalidRange {
                timeframe: Timeframe::FourDay,
                ..
            })
        ));
        assert!(outcome.opened.is_none());
        // The open short is still stopped out at 150 >= 145.
        assert_eq!(outcome.closed.len(), 1);
    }

    #[test]
    fn no_zone_match_is_reported_and_skipped() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut rsi = overbought(10.0);
        rsi.value = 5.0;
        let mut t = tick(105.0, Trend::Up, rsi);
        t.macd.divergence = true;
        let outcome = engine.process_tick(&t).unwrap();

        assert_eq!(outcome.score_total(), 4);
        assert_eq!(
            outcome.entry_rejection,
            Some(EngineError::NoZoneMatch { price: 105.0 })
        );
        assert!(outcome.opened.is_none());
        assert_eq!(engine.open_positions().len(), 0);
    }

    #[test]
    fn engine_usable_after_rejection() {
        let mut engine = Engine::new(EngineConfig::default());
        assert!(
            engine
                .process_tick(&tick(f64::INFINITY, Trend::Up, overbought(10.0)))
                .is_err()
        );
        let outcome = engine
            .process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();
        assert!(outcome.opened.is_some());
    }

    #[test]
    fn independent_engines_do_not_share_state() {
        let mut a = Engine::new(deferred());
        let b = Engine::new(deferred());
        a.process_tick(&tick(136.0, Trend::Down, overbought(10.0)))
            .unwrap();
        assert_eq!(a.open_positions().len(), 1);
        assert!(b.open_positions().is_empty());
    }
}
