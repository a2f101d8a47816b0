//! Fibonacci retracement levels.
//!
//! Levels are a linear interpolation between two anchors:
//! `level(r) = low + (high - low) * r`. No ordering check is applied to the
//! anchors; passing `(high, low)` mirrors every level around the midpoint,
//! which is how take-profit targets for long entries are derived.

use std::fmt;

/// The six retracement ratios tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FibLevel {
    Zero,
    Half,
    Golden,
    Deep,
    ThreeQuarter,
    One,
}

impl FibLevel {
    pub const ALL: [FibLevel; 6] = [
        FibLevel::Zero,
        FibLevel::Half,
        FibLevel::Golden,
        FibLevel::Deep,
        FibLevel::ThreeQuarter,
        FibLevel::One,
    ];

    pub fn ratio(self) -> f64 {
        match self {
            FibLevel::Zero => 0.0,
            FibLevel::Half => 0.5,
            FibLevel::Golden => 0.618,
            FibLevel::Deep => 0.72,
            FibLevel::ThreeQuarter => 0.75,
            FibLevel::One => 1.0,
        }
    }
}

impl fmt::Display for FibLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FibLevel::Zero => write!(f, "0"),
            FibLevel::Half => write!(f, "0.5"),
            FibLevel::Golden => write!(f, "0.618"),
            FibLevel::Deep => write!(f, "0.72"),
            FibLevel::ThreeQuarter => write!(f, "0.75"),
            FibLevel::One => write!(f, "1"),
        }
    }
}

/// Levels anchored at `from` (ratio 0) and `to` (ratio 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibonacciLevels {
    pub from: f64,
    pub to: f64,
}

impl FibonacciLevels {
    pub fn level(&self, level: FibLevel) -> f64 {
        self.at(level.ratio())
    }

    /// Interpolate an arbitrary ratio between the anchors.
    pub fn at(&self, ratio: f64) -> f64 {
        self.from + (self.to - self.from) * ratio
    }

    /// Inclusive interval between two levels, returned as `(min, max)`.
    pub fn zone(&self, lower: FibLevel, upper: FibLevel) -> (f64, f64) {
        let a = self.level(lower);
        let b = self.level(upper);
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn contains(&self, price: f64, lower: FibLevel, upper: FibLevel) -> bool {
        let (min, max) = self.zone(lower, upper);
        min <= price && price <= max
    }

    /// All six levels in ratio order.
    pub fn all(&self) -> [(FibLevel, f64); 6] {
        FibLevel::ALL.map(|l| (l, self.level(l)))
    }
}

/// Compute retracement levels for a `(low, high)` pair.
pub fn levels(low: f64, high: f64) -> FibonacciLevels {
    FibonacciLevels { from: low, to: high }
}
