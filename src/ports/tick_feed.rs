//! Market tick source port trait.

use crate::domain::error::EngineError;
use crate::domain::market::Tick;

/// A source of ticks, consumed in order.
///
/// `None` means the feed is exhausted. A `Some(Err(_))` is a bad record; the
/// caller decides whether to skip it or stop.
pub trait TickFeed {
    fn next_tick(&mut self) -> Option<Result<Tick, EngineError>>;
}
