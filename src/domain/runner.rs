//! Drives an [`Engine`] from a tick feed, persisting closed trades as they
//! happen.
//!
//! Bad feed records and rejected ticks are counted and skipped. Only a
//! ledger failure stops the run, since trades would otherwise be lost.

use tracing::{info, warn};

use super::engine::Engine;
use super::error::EngineError;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::tick_feed::TickFeed;

/// Counters for one pass over a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub ticks: usize,
    pub rejected_ticks: usize,
    pub feed_errors: usize,
    pub entry_rejections: usize,
    pub opened: usize,
    pub partials: usize,
    pub closed: usize,
    pub last_price: Option<f64>,
}

pub fn run_feed(
    engine: &mut Engine,
    feed: &mut dyn TickFeed,
    mut ledger: Option<&mut dyn LedgerPort>,
) -> Result<RunStats, EngineError> {
    let mut stats = RunStats::default();

    while let Some(next) = feed.next_tick() {
        let tick = match next {
            Ok(tick) => tick,
            Err(e) => {
                warn!(error = %e, "skipping feed record");
                stats.feed_errors += 1;
                continue;
            }
        };

        let outcome = match engine.process_tick(&tick) {
            Ok(outcome) => outcome,
            Err(_) => {
                stats.rejected_ticks += 1;
                continue;
            }
        };

        stats.ticks += 1;
        stats.last_price = Some(tick.price);
        stats.opened += usize::from(outcome.opened.is_some());
        stats.entry_rejections += usize::from(outcome.entry_rejection.is_some());
        stats.partials += outcome.partials.len();
        stats.closed += outcome.closed.len();

        if let Some(ledger) = ledger.as_deref_mut() {
            ledger.persist(&outcome.closed)?;
        }
    }

    info!(
        ticks = stats.ticks,
        rejected = stats.rejected_ticks,
        feed_errors = stats.feed_errors,
        closed = stats.closed,
        balance = engine.balance(),
        "feed exhausted"
    );
    Ok(stats)
}
