//! Entry decisions: direction, exit targets and position size.
//!
//! Steps, once a score clears the threshold:
//! 1. Direction comes from the trend alone (up = long, down = short)
//! 2. The nearest timeframe whose zone holds the price is selected
//!    (4-day, then 1-week, then 2-week)
//! 3. Stop-loss is the 1-week high, or the 2-week high when 2-week matched
//! 4. Take-profits are the 0.5/0.75 levels of the matched range, anchored at
//!    the high for longs and at the low for shorts
//! 5. Size is a score-proportional, capped fraction of the balance

use chrono::NaiveDateTime;

use super::account::Account;
use super::error::EngineError;
use super::fibonacci::FibLevel;
use super::market::{Timeframe, Timeframes, Trend};
use super::position::{Direction, Position, PositionStage};

/// Sizing and gating parameters for new entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryConfig {
    pub min_score: u32,
    pub fraction_per_point: f64,
    pub max_fraction: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            min_score: 4,
            fraction_per_point: 0.1,
            max_fraction: 0.5,
        }
    }
}

impl EntryConfig {
    pub fn capital_fraction(&self, score: u32) -> f64 {
        (self.fraction_per_point * score as f64).min(self.max_fraction)
    }
}

/// Everything needed to open a position.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPlan {
    pub direction: Direction,
    pub matched: Timeframe,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_50: f64,
    pub take_profit_75: f64,
    pub capital_fraction: f64,
    pub amount: f64,
    pub score: u32,
    pub time: NaiveDateTime,
    pub reason: String,
}

/// First timeframe, nearest first, whose zone contains `price`.
pub fn nearest_zone(timeframes: &Timeframes, price: f64) -> Option<Timeframe> {
    Timeframe::NEAREST_FIRST
        .into_iter()
        .find(|tf| timeframes.in_zone(*tf, price))
}

/// Decide whether and how to enter.
///
/// Returns `Ok(None)` when the score is below the threshold. A score that
/// clears the threshold but has no zone match, or a balance that cannot fund
/// an entry, is an error and nothing is opened.
pub fn plan(
    score: u32,
    trend: Trend,
    timeframes: &Timeframes,
    price: f64,
    balance: f64,
    time: NaiveDateTime,
    config: &EntryConfig,
) -> Result<Option<EntryPlan>, EngineError> {
    if score < config.min_score {
        return Ok(None);
    }

    let direction = Direction::from_trend(trend);

    let matched = nearest_zone(timeframes, price).ok_or(EngineError::NoZoneMatch { price })?;
    let range = timeframes.get(matched);

    let stop_loss = match matched {
        Timeframe::TwoWeek => range.levels().level(FibLevel::One),
        Timeframe::OneWeek | Timeframe::FourDay => {
            timeframes.one_week.levels().level(FibLevel::One)
        }
    };

    let targets = match direction {
        Direction::Long => range.inverted_levels(),
        Direction::Short => range.levels(),
    };

    check_balance(balance)?;

    let capital_fraction = config.capital_fraction(score);
    let amount = balance * capital_fraction;

    Ok(Some(EntryPlan {
        direction,
        matched,
        entry_price: price,
        stop_loss,
        take_profit_50: targets.level(FibLevel::Half),
        take_profit_75: targets.level(FibLevel::ThreeQuarter),
        capital_fraction,
        amount,
        score,
        time,
        reason: format!("Score: {score}, Trend: {trend}"),
    }))
}

fn check_balance(balance: f64) -> Result<(), EngineError> {
    if balance <= 0.0 || !balance.is_finite() {
        return Err(EngineError::NonPositiveBalance { balance });
    }
    Ok(())
}

impl EntryPlan {
    /// Size the same entry against `balance`, keeping its capital fraction.
    pub fn resized(mut self, balance: f64) -> Result<EntryPlan, EngineError> {
        check_balance(balance)?;
        self.amount = balance * self.capital_fraction;
        Ok(self)
    }
}

/// Turn a plan into a fresh position at stage `Open`.
pub fn build_position(id: u64, plan: EntryPlan) -> Position {
    Position {
        id,
        direction: plan.direction,
        entry_price: plan.entry_price,
        amount: plan.amount,
        initial_amount: plan.amount,
        stop_loss: plan.stop_loss,
        take_profit_50: plan.take_profit_50,
        take_profit_75: plan.take_profit_75,
        open_time: plan.time,
        score: plan.score,
        reason: plan.reason,
        stage: PositionStage::Open,
        partial_profit: 0.0,
    }
}

/// Add a position to the account, debiting the balance for longs.
pub fn open_position(account: &mut Account, position: Position) {
    if position.direction.reserves_capital() {
        account.balance -= position.amount;
    }
    account.add_position(position);
}
