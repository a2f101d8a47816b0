#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use fibtrader::domain::error::EngineError;
use fibtrader::domain::market::{Macd, Range, Rsi, Tick, Timeframes, Trend};
use fibtrader::domain::position::ClosedTrade;
use fibtrader::ports::ledger_port::LedgerPort;
use fibtrader::ports::tick_feed::TickFeed;
use std::collections::VecDeque;

pub const TICK_HEADER: &str = "time,price,trend,low_2w,high_2w,low_1w,high_1w,low_4d,high_4d,rsi_value,rsi_divergence,rsi_overbought,rsi_oversold,macd_divergence";

pub struct MockTickFeed {
    pub ticks: VecDeque<Result<Tick, EngineError>>,
}

impl MockTickFeed {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks: ticks.into_iter().map(Ok).collect(),
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.ticks.push_back(Err(EngineError::Feed {
            reason: reason.to_string(),
        }));
        self
    }
}

impl TickFeed for MockTickFeed {
    fn next_tick(&mut self) -> Option<Result<Tick, EngineError>> {
        self.ticks.pop_front()
    }
}

#[derive(Default)]
pub struct MockLedger {
    pub trades: Vec<ClosedTrade>,
    pub batches: usize,
}

impl LedgerPort for MockLedger {
    fn persist(&mut self, trades: &[ClosedTrade]) -> Result<(), EngineError> {
        if !trades.is_empty() {
            self.batches += 1;
        }
        self.trades.extend_from_slice(trades);
        Ok(())
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// 2w = {100, 150}, 1w = {110, 145}, 4d = {120, 140}.
pub fn sample_timeframes() -> Timeframes {
    Timeframes {
        two_week: Range::new(100.0, 150.0),
        one_week: Range::new(110.0, 145.0),
        four_day: Range::new(120.0, 140.0),
    }
}

pub fn quiet_rsi() -> Rsi {
    Rsi {
        value: 50.0,
        divergence: false,
        overbought: false,
        oversold: false,
    }
}

/// Divergent and overbought at `value`.
pub fn overbought_rsi(value: f64) -> Rsi {
    Rsi {
        value,
        divergence: true,
        overbought: true,
        oversold: false,
    }
}

/// Tick `minute` minutes after [`base_time`] on the sample ranges.
pub fn make_tick(minute: i64, price: f64, trend: Trend, rsi: Rsi) -> Tick {
    Tick {
        time: base_time() + TimeDelta::minutes(minute),
        price,
        trend,
        timeframes: sample_timeframes(),
        rsi,
        macd: Macd::default(),
    }
}

/// A CSV row on the sample ranges, in [`TICK_HEADER`] column order.
pub fn csv_row(
    time: &str,
    price: f64,
    trend: &str,
    rsi_value: f64,
    divergence: bool,
    overbought: bool,
) -> String {
    format!(
        "{time},{price},{trend},100,150,110,145,120,140,{rsi_value},{divergence},{overbought},false,false"
    )
}
