//! Per-tick market inputs supplied by the market-data feed.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use super::fibonacci::{self, FibLevel, FibonacciLevels};

/// Lookback window a range was measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    TwoWeek,
    OneWeek,
    FourDay,
}

impl Timeframe {
    /// Order in which the entry planner looks for the nearest matching zone.
    pub const NEAREST_FIRST: [Timeframe; 3] =
        [Timeframe::FourDay, Timeframe::OneWeek, Timeframe::TwoWeek];

    /// Retracement zone a price must sit in for this timeframe to score.
    pub fn zone(self) -> (FibLevel, FibLevel) {
        match self {
            Timeframe::TwoWeek => (FibLevel::Half, FibLevel::Golden),
            Timeframe::OneWeek => (FibLevel::Golden, FibLevel::ThreeQuarter),
            Timeframe::FourDay => (FibLevel::Deep, FibLevel::ThreeQuarter),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::TwoWeek => write!(f, "2w"),
            Timeframe::OneWeek => write!(f, "1w"),
            Timeframe::FourDay => write!(f, "4d"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub fn new(low: f64, high: f64) -> Self {
        Range { low, high }
    }

    /// Levels in the natural `(low, high)` orientation.
    pub fn levels(&self) -> FibonacciLevels {
        fibonacci::levels(self.low, self.high)
    }

    /// Levels anchored at the high, used for long take-profit targets.
    pub fn inverted_levels(&self) -> FibonacciLevels {
        fibonacci::levels(self.high, self.low)
    }

    pub fn validate(&self, timeframe: Timeframe) -> Result<(), EngineError> {
        if !self.low.is_finite() || !self.high.is_finite() || self.high < self.low {
            return Err(EngineError::InvalidRange {
                timeframe,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// The three ranges consulted on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeframes {
    pub two_week: Range,
    pub one_week: Range,
    pub four_day: Range,
}

impl Timeframes {
    pub fn get(&self, timeframe: Timeframe) -> &Range {
        match timeframe {
            Timeframe::TwoWeek => &self.two_week,
            Timeframe::OneWeek => &self.one_week,
            Timeframe::FourDay => &self.four_day,
        }
    }

    /// True when `price` sits inside the zone of `timeframe`.
    pub fn in_zone(&self, timeframe: Timeframe, price: f64) -> bool {
        let (lower, upper) = timeframe.zone();
        self.get(timeframe).levels().contains(price, lower, upper)
    }

    /// Fails on the first inverted or non-finite range.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.two_week.validate(Timeframe::TwoWeek)?;
        self.one_week.validate(Timeframe::OneWeek)?;
        self.four_day.validate(Timeframe::FourDay)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            other => Err(format!("unknown trend '{other}' (expected up or down)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rsi {
    pub value: f64,
    pub divergence: bool,
    pub overbought: bool,
    pub oversold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Macd {
    pub divergence: bool,
}

/// One observation from the market-data feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub time: NaiveDateTime,
    pub price: f64,
    pub trend: Trend,
    pub timeframes: Timeframes,
    pub rsi: Rsi,
    pub macd: Macd,
}
