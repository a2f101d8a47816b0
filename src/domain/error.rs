//! Domain error types.

use crate::domain::market::Timeframe;

/// Top-level error type for fibtrader.
///
/// Engine-input variants (`InvalidRange`, `NoZoneMatch`, `NonPositiveBalance`,
/// `InvalidPrice`) are local to a single tick; the engine stays usable after
/// returning any of them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid {timeframe} range [{low}, {high}]")]
    InvalidRange {
        timeframe: Timeframe,
        low: f64,
        high: f64,
    },

    #[error("price {price} is outside every timeframe zone")]
    NoZoneMatch { price: f64 },

    #[error("cannot size an entry against balance {balance}")]
    NonPositiveBalance { balance: f64 },

    #[error("invalid tick price {price}")]
    InvalidPrice { price: f64 },

    /// Raised by the `levels` command, not by the engine.
    #[error("invalid level range [{low}, {high}]")]
    InvalidLevelRange { low: f64, high: f64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("tick feed error: {reason}")]
    Feed { reason: String },

    #[error("ledger error: {reason}")]
    Ledger { reason: String },
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::ConfigParse { .. } | EngineError::ConfigInvalid { .. } => 2,
            EngineError::Feed { .. } | EngineError::Ledger { .. } => 3,
            EngineError::InvalidRange { .. }
            | EngineError::NoZoneMatch { .. }
            | EngineError::NonPositiveBalance { .. }
            | EngineError::InvalidPrice { .. }
            | EngineError::InvalidLevelRange { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
