//! Seeded random tick feed.
//!
//! Prices are drawn uniformly from `[price_low, price_high)` and the trend is
//! a coin flip. Ranges and indicator readings stay fixed for the whole run.
//! Ticks are one minute apart.

use chrono::{NaiveDateTime, TimeDelta};
use rand::prelude::*;

use crate::adapters::csv_tick_feed::TIME_FORMAT;
use crate::domain::error::EngineError;
use crate::domain::market::{Macd, Range, Rsi, Tick, Timeframe, Timeframes, Trend};
use crate::ports::config_port::ConfigPort;
use crate::ports::tick_feed::TickFeed;

pub const SIMULATION_SECTION: &str = "simulation";
const DEFAULT_START_TIME: &str = "2024-01-01 00:00:00";

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub price_low: f64,
    pub price_high: f64,
    pub timeframes: Timeframes,
    pub rsi: Rsi,
    pub macd: Macd,
    pub start_time: NaiveDateTime,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            price_low: 100.0,
            price_high: 150.0,
            timeframes: Timeframes {
                two_week: Range::new(100.0, 150.0),
                one_week: Range::new(110.0, 145.0),
                four_day: Range::new(120.0, 140.0),
            },
            rsi: Rsi {
                value: 70.0,
                divergence: true,
                overbought: true,
                oversold: false,
            },
            macd: Macd { divergence: false },
            start_time: NaiveDateTime::parse_from_str(DEFAULT_START_TIME, TIME_FORMAT)
                .unwrap_or_default(),
        }
    }
}

fn invalid(key: &str, reason: String) -> EngineError {
    EngineError::ConfigInvalid {
        section: SIMULATION_SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}

impl SimulationConfig {
    /// Read the `[simulation]` section; absent keys keep their defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let range = |tf: Timeframe, r: Range| {
            Range::new(
                config.get_double(SIMULATION_SECTION, &format!("low_{tf}"), r.low),
                config.get_double(SIMULATION_SECTION, &format!("high_{tf}"), r.high),
            )
        };

        let start_time = match config.get_string(SIMULATION_SECTION, "start_time") {
            Some(s) => NaiveDateTime::parse_from_str(&s, TIME_FORMAT).map_err(|_| {
                invalid(
                    "start_time",
                    "invalid time format (expected YYYY-MM-DD HH:MM:SS)".into(),
                )
            })?,
            None => d.start_time,
        };

        let sim = SimulationConfig {
            price_low: config.get_double(SIMULATION_SECTION, "price_low", d.price_low),
            price_high: config.get_double(SIMULATION_SECTION, "price_high", d.price_high),
            timeframes: Timeframes {
                two_week: range(Timeframe::TwoWeek, d.timeframes.two_week),
                one_week: range(Timeframe::OneWeek, d.timeframes.one_week),
                four_day: range(Timeframe::FourDay, d.timeframes.four_day),
            },
            rsi: Rsi {
                value: config.get_double(SIMULATION_SECTION, "rsi_value", d.rsi.value),
                divergence: config.get_bool(SIMULATION_SECTION, "rsi_divergence", d.rsi.divergence),
                overbought: config.get_bool(SIMULATION_SECTION, "rsi_overbought", d.rsi.overbought),
                oversold: config.get_bool(SIMULATION_SECTION, "rsi_oversold", d.rsi.oversold),
            },
            macd: Macd {
                divergence: config.get_bool(
                    SIMULATION_SECTION,
                    "macd_divergence",
                    d.macd.divergence,
                ),
            },
            start_time,
        };
        sim.validate()?;
        Ok(sim)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.price_low.is_finite() && self.price_high.is_finite())
            || self.price_low <= 0.0
            || self.price_low >= self.price_high
        {
            return Err(invalid(
                "price_low",
                format!(
                    "price range [{}, {}) must be positive and non-empty",
                    self.price_low, self.price_high
                ),
            ));
        }

        self.timeframes.validate().map_err(|e| match e {
            EngineError::InvalidRange { timeframe, .. } => {
                invalid(&format!("low_{timeframe}"), e.to_string())
            }
            other => other,
        })
    }
}

pub struct SimulatedFeed {
    config: SimulationConfig,
    rng: StdRng,
    next_time: NaiveDateTime,
    remaining: Option<u64>,
}

impl SimulatedFeed {
    /// `seed` makes the stream reproducible; `limit` caps the number of
    /// ticks (unbounded when `None`).
    pub fn new(
        config: SimulationConfig,
        seed: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            next_time: config.start_time,
            config,
            rng,
            remaining: limit,
        })
    }

    fn generate(&mut self) -> Tick {
        let price = self
            .rng
            .gen_range(self.config.price_low..self.config.price_high);
        let trend = if self.rng.gen_bool(0.5) {
            Trend::Up
        } else {
            Trend::Down
        };
        let time = self.next_time;
        self.next_time = time + TimeDelta::minutes(1);

        Tick {
            time,
            price,
            trend,
            timeframes: self.config.timeframes,
            rsi: self.config.rsi,
            macd: self.config.macd,
        }
    }
}

impl TickFeed for SimulatedFeed {
    fn next_tick(&mut self) -> Option<Result<Tick, EngineError>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        Some(Ok(self.generate()))
    }
}
