//! Engine configuration and validation.
//!
//! All keys live under the `[engine]` section; every key is optional and
//! falls back to its default.

use crate::domain::entry::EntryConfig;
use crate::domain::error::EngineError;
use crate::domain::scoring::RsiThresholds;
use crate::ports::config_port::ConfigPort;

pub const ENGINE_SECTION: &str = "engine";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_balance: f64,
    pub entry: EntryConfig,
    pub rsi: RsiThresholds,
    /// Evaluate a freshly opened position against the price of the tick that
    /// opened it. Since that price equals the entry price, such a position is
    /// closed on the same tick (by its stop or at breakeven).
    pub settle_on_entry_tick: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_balance: 10_000.0,
            entry: EntryConfig::default(),
            rsi: RsiThresholds::default(),
            settle_on_entry_tick: true,
        }
    }
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_initial_balance(config)?;
    validate_min_score(config)?;
    validate_fractions(config)?;
    Ok(())
}

/// Validate and build the engine configuration.
pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, EngineError> {
    validate_engine_config(config)?;
    let defaults = EngineConfig::default();

    Ok(EngineConfig {
        initial_balance: config.get_double(
            ENGINE_SECTION,
            "initial_balance",
            defaults.initial_balance,
        ),
        entry: EntryConfig {
            min_score: config.get_int(
                ENGINE_SECTION,
                "min_score",
                defaults.entry.min_score as i64,
            ) as u32,
            fraction_per_point: config.get_double(
                ENGINE_SECTION,
                "fraction_per_point",
                defaults.entry.fraction_per_point,
            ),
            max_fraction: config.get_double(
                ENGINE_SECTION,
                "max_fraction",
                defaults.entry.max_fraction,
            ),
        },
        rsi: RsiThresholds {
            extreme_overbought_below: config.get_double(
                ENGINE_SECTION,
                "rsi_extreme_overbought_below",
                defaults.rsi.extreme_overbought_below,
            ),
            extreme_oversold_above: config.get_double(
                ENGINE_SECTION,
                "rsi_extreme_oversold_above",
                defaults.rsi.extreme_oversold_above,
            ),
        },
        settle_on_entry_tick: config.get_bool(
            ENGINE_SECTION,
            "settle_on_entry_tick",
            defaults.settle_on_entry_tick,
        ),
    })
}

fn invalid(key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: ENGINE_SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double(
        ENGINE_SECTION,
        "initial_balance",
        EngineConfig::default().initial_balance,
    );
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "initial_balance",
            "initial_balance must be positive",
        ));
    }
    Ok(())
}

fn validate_min_score(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_int(ENGINE_SECTION, "min_score", 4);
    if value < 0 || value > u32::MAX as i64 {
        return Err(invalid("min_score", "min_score must be non-negative"));
    }
    Ok(())
}

fn validate_fractions(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let defaults = EntryConfig::default();
    for (key, default) in [
        ("fraction_per_point", defaults.fraction_per_point),
        ("max_fraction", defaults.max_fraction),
    ] {
        let value = config.get_double(ENGINE_SECTION, key, default);
        if value <= 0.0 || value > 1.0 {
            return Err(invalid(key, &format!("{key} must be in (0, 1]")));
        }
    }
    Ok(())
}
