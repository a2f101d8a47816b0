//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_ledger::CsvLedger;
use crate::adapters::csv_tick_feed::CsvTickFeed;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::simulated_feed::{SimulatedFeed, SimulationConfig};
use crate::domain::config::{build_engine_config, EngineConfig};
use crate::domain::engine::Engine;
use crate::domain::error::EngineError;
use crate::domain::fibonacci;
use crate::domain::runner::{self, RunStats};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::tick_feed::TickFeed;

pub const LEDGER_SECTION: &str = "ledger";

#[derive(Parser, Debug)]
#[command(name = "fibtrader", about = "Fibonacci confluence trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay ticks from a CSV file
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticks: PathBuf,
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Run the engine against randomly generated ticks
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value_t = 1000)]
        ticks: u64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Print the Fibonacci levels of a range
    Levels {
        #[arg(long, allow_negative_numbers = true)]
        low: f64,
        #[arg(long, allow_negative_numbers = true)]
        high: f64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            ticks,
            ledger,
        } => run_replay(&config, &ticks, ledger.as_deref()),
        Command::Simulate {
            config,
            ticks,
            seed,
            ledger,
        } => run_simulate(&config, ticks, seed, ledger.as_deref()),
        Command::Levels { low, high } => run_levels(low, high),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// `--ledger` wins over `[ledger] path`; with neither, trades are not persisted.
pub fn resolve_ledger(flag: Option<&Path>, config: &dyn ConfigPort) -> Option<CsvLedger> {
    flag.map(Path::to_path_buf)
        .or_else(|| {
            config
                .get_string(LEDGER_SECTION, "path")
                .map(PathBuf::from)
        })
        .map(CsvLedger::new)
}

fn load_engine_config(config_path: &Path) -> Result<(FileConfigAdapter, EngineConfig), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let engine_config = build_engine_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok((adapter, engine_config))
}

pub fn run_replay(config_path: &Path, ticks_path: &Path, ledger_flag: Option<&Path>) -> ExitCode {
    let (adapter, engine_config) = match load_engine_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut feed = match CsvTickFeed::from_path(ticks_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Replaying ticks from {}", ticks_path.display());
    let ledger = resolve_ledger(ledger_flag, &adapter);
    drive(engine_config, &mut feed, ledger)
}

pub fn run_simulate(
    config_path: &Path,
    ticks: u64,
    seed: Option<u64>,
    ledger_flag: Option<&Path>,
) -> ExitCode {
    let (adapter, engine_config) = match load_engine_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let feed = SimulationConfig::from_config(&adapter)
        .and_then(|sim| SimulatedFeed::new(sim, seed, Some(ticks)));
    let mut feed = match feed {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match seed {
        Some(seed) => eprintln!("Simulating {ticks} ticks (seed {seed})"),
        None => eprintln!("Simulating {ticks} ticks"),
    }
    let ledger = resolve_ledger(ledger_flag, &adapter);
    drive(engine_config, &mut feed, ledger)
}

fn drive(
    engine_config: EngineConfig,
    feed: &mut dyn TickFeed,
    mut ledger: Option<CsvLedger>,
) -> ExitCode {
    let mut engine = Engine::new(engine_config);

    if let Some(l) = &ledger {
        eprintln!("Appending closed trades to {}", l.path().display());
    }

    let stats = match runner::run_feed(
        &mut engine,
        feed,
        ledger.as_mut().map(|l| l as &mut dyn LedgerPort),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for trade in engine.history() {
        println!(
            "{}\t{}\t{}\t{:.4}\t{:.4}\t{}\t{:.2}\t{:.2}",
            trade.position_id,
            trade.direction,
            trade.close_time,
            trade.entry_price,
            trade.close_price,
            trade.close_reason,
            trade.profit,
            trade.partial_profit,
        );
    }

    print_summary(&engine, &stats);
    ExitCode::SUCCESS
}

fn print_summary(engine: &Engine, stats: &RunStats) {
    let summary = engine.account().history.summary();
    let account = engine.account();

    eprintln!("\n=== Run Summary ===");
    eprintln!("Ticks Processed:  {}", stats.ticks);
    if stats.rejected_ticks > 0 || stats.feed_errors > 0 {
        eprintln!(
            "Skipped:          {} rejected, {} unreadable",
            stats.rejected_ticks, stats.feed_errors
        );
    }
    eprintln!("Entries:          {} opened, {} rejected", stats.opened, stats.entry_rejections);
    eprintln!("Partial Closes:   {}", stats.partials);
    eprintln!("Closed Trades:    {}", summary.total_trades);
    eprintln!(
        "  Winners/Losers: {}/{} ({} breakeven, {} stopped)",
        summary.winners, summary.losers, summary.breakeven, summary.stop_losses
    );
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Total Profit:     {:.2}", summary.total_profit);
    eprintln!("Initial Balance:  {:.2}", account.initial_balance);
    eprintln!("Final Balance:    {:.2}", account.balance);
    if let Some(price) = stats.last_price {
        eprintln!(
            "Equity @ {:.2}:  {:.2} ({} open)",
            price,
            account.equity(price),
            account.position_count()
        );
    }
}

pub fn run_levels(low: f64, high: f64) -> ExitCode {
    if !low.is_finite() || !high.is_finite() {
        let err = EngineError::InvalidLevelRange { low, high };
        eprintln!("error: {err}");
        return (&err).into();
    }

    for (level, price) in fibonacci::levels(low, high).all() {
        println!("{level}\t{price:.4}");
    }
    ExitCode::SUCCESS
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    let (adapter, engine_config) = match load_engine_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let sim = match SimulationConfig::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nEngine:");
    eprintln!("  initial_balance:   {:.2}", engine_config.initial_balance);
    eprintln!("  min_score:         {}", engine_config.entry.min_score);
    eprintln!(
        "  sizing:            {} per point, capped at {}",
        engine_config.entry.fraction_per_point, engine_config.entry.max_fraction
    );
    eprintln!(
        "  rsi thresholds:    overbought below {}, oversold above {}",
        engine_config.rsi.extreme_overbought_below, engine_config.rsi.extreme_oversold_above
    );
    eprintln!("  settle on entry:   {}", engine_config.settle_on_entry_tick);

    eprintln!("\nSimulation:");
    eprintln!("  price:             [{}, {})", sim.price_low, sim.price_high);
    eprintln!(
        "  ranges:            2w {}-{}, 1w {}-{}, 4d {}-{}",
        sim.timeframes.two_week.low,
        sim.timeframes.two_week.high,
        sim.timeframes.one_week.low,
        sim.timeframes.one_week.high,
        sim.timeframes.four_day.low,
        sim.timeframes.four_day.high,
    );
    eprintln!("  start:             {}", sim.start_time);

    match resolve_ledger(None, &adapter) {
        Some(l) => eprintln!("\nLedger: {}", l.path().display()),
        None => eprintln!("\nLedger: not configured"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
