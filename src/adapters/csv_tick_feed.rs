//! CSV tick file adapter.
//!
//! One tick per row, headers required:
//! `time,price,trend,low_2w,high_2w,low_1w,high_1w,low_4d,high_4d,rsi_value,rsi_divergence,rsi_overbought,rsi_oversold,macd_divergence`.
//! Booleans are `true`/`false`; times use [`TIME_FORMAT`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::error::EngineError;
use crate::domain::market::{Macd, Range, Rsi, Tick, Timeframes, Trend};
use crate::ports::tick_feed::TickFeed;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct TickRow {
    time: String,
    price: f64,
    trend: String,
    low_2w: f64,
    high_2w: f64,
    low_1w: f64,
    high_1w: f64,
    low_4d: f64,
    high_4d: f64,
    rsi_value: f64,
    rsi_divergence: bool,
    rsi_overbought: bool,
    rsi_oversold: bool,
    macd_divergence: bool,
}

impl TickRow {
    fn into_tick(self, line: u64) -> Result<Tick, EngineError> {
        let time = NaiveDateTime::parse_from_str(self.time.trim(), TIME_FORMAT).map_err(|e| {
            EngineError::Feed {
                reason: format!("line {line}: invalid time '{}': {e}", self.time),
            }
        })?;
        let trend: Trend = self.trend.parse().map_err(|e| EngineError::Feed {
            reason: format!("line {line}: {e}"),
        })?;

        Ok(Tick {
            time,
            price: self.price,
            trend,
            timeframes: Timeframes {
                two_week: Range::new(self.low_2w, self.high_2w),
                one_week: Range::new(self.low_1w, self.high_1w),
                four_day: Range::new(self.low_4d, self.high_4d),
            },
            rsi: Rsi {
                value: self.rsi_value,
                divergence: self.rsi_divergence,
                overbought: self.rsi_overbought,
                oversold: self.rsi_oversold,
            },
            macd: Macd {
                divergence: self.macd_divergence,
            },
        })
    }
}

pub struct CsvTickFeed<R: Read> {
    rows: csv::DeserializeRecordsIntoIter<R, TickRow>,
    line: u64,
}

impl CsvTickFeed<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| EngineError::Feed {
                reason: format!("failed to open {}: {e}", path.display()),
            })?;
        Ok(Self::new(reader))
    }
}

impl<R: Read> CsvTickFeed<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader),
        )
    }

    fn new(reader: csv::Reader<R>) -> Self {
        CsvTickFeed {
            rows: reader.into_deserialize(),
            // Line 1 is the header.
            line: 1,
        }
    }
}

impl<R: Read> TickFeed for CsvTickFeed<R> {
    fn next_tick(&mut self) -> Option<Result<Tick, EngineError>> {
        let row = self.rows.next()?;
        self.line += 1;
        let line = self.line;
        Some(
            row.map_err(|e| EngineError::Feed {
                reason: format!("line {line}: CSV parse error: {e}"),
            })
            .and_then(|row| row.into_tick(line)),
        )
    }
}
