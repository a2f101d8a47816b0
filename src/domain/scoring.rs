//! Multi-timeframe signal scoring.
//!
//! A score is the sum of:
//! - one point per timeframe whose retracement zone contains the price
//! - one point each for RSI and MACD divergence
//! - two points for an "extreme" RSI reading, otherwise one point for any
//!   overbought/oversold flag
//!
//! The extreme checks pair `overbought` with a *low* RSI value and `oversold`
//! with a *high* one. That pairing is kept exactly as configured; see
//! [`RsiThresholds`].

use super::market::{Macd, Rsi, Timeframe, Timeframes};

/// Cut-offs for the extreme RSI bonus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    /// `overbought` scores as extreme when `value` is strictly below this.
    pub extreme_overbought_below: f64,
    /// `oversold` scores as extreme when `value` is strictly above this.
    pub extreme_oversold_above: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        RsiThresholds {
            extreme_overbought_below: 15.0,
            extreme_oversold_above: 75.0,
        }
    }
}

/// Per-component view of a score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub zone_hits: Vec<Timeframe>,
    pub divergence_points: u32,
    pub rsi_points: u32,
}

impl ScoreBreakdown {
    pub fn zone_points(&self) -> u32 {
        self.zone_hits.len() as u32
    }

    pub fn total(&self) -> u32 {
        self.zone_points() + self.divergence_points + self.rsi_points
    }
}

pub fn score_breakdown(
    price: f64,
    timeframes: &Timeframes,
    rsi: &Rsi,
    macd: &Macd,
    thresholds: &RsiThresholds,
) -> ScoreBreakdown {
    let zone_hits: Vec<Timeframe> = [Timeframe::TwoWeek, Timeframe::OneWeek, Timeframe::FourDay]
        .into_iter()
        .filter(|tf| timeframes.in_zone(*tf, price))
        .collect();

    let divergence_points = u32::from(rsi.divergence) + u32::from(macd.divergence);

    let rsi_points = if rsi.overbought && rsi.value < thresholds.extreme_overbought_below {
        2
    } else if rsi.oversold && rsi.value > thresholds.extreme_oversold_above {
        2
    } else if rsi.overbought || rsi.oversold {
        1
    } else {
        0
    };

    ScoreBreakdown {
        zone_hits,
        divergence_points,
        rsi_points,
    }
}

pub fn score(
    price: f64,
    timeframes: &Timeframes,
    rsi: &Rsi,
    macd: &Macd,
    thresholds: &RsiThresholds,
) -> u32 {
    score_breakdown(price, timeframes, rsi, macd, thresholds).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Range;

    fn timeframes() -> Timeframes {
        Timeframes {
            two_week: Range::new(100.0, 150.0),
            one_week: Range::new(110.0, 145.0),
            four_day: Range::new(120.0, 140.0),
        }
    }

    fn rsi(value: f64, divergence: bool, overbought: bool, oversold: bool) -> Rsi {
        Rsi {
            value,
            divergence,
            overbought,
            oversold,
        }
    }

    fn th() -> RsiThresholds {
        RsiThresholds::default()
    }

    #[test]
    fn all_false_outside_zones_scores_zero() {
        let s = score(
            105.0,
            &timeframes(),
            &Rsi::default(),
            &Macd::default(),
            &th(),
        );
        assert_eq!(s, 0);
    }

    #[test]
    fn one_week_zone_only() {
        let b = score_breakdown(
            136.0,
            &timeframes(),
            &Rsi::default(),
            &Macd::default(),
            &th(),
        );
        assert_eq!(b.zone_hits, vec![Timeframe::OneWeek]);
        assert_eq!(b.total(), 1);
    }

    #[test]
    fn overlapping_zones_each_score() {
        // 135 sits in both the 1w zone [131.63, 136.25] and the 4d zone [134.4, 135]
        let b = score_breakdown(
            135.0,
            &timeframes(),
            &Rsi::default(),
            &Macd::default(),
            &th(),
        );
        assert_eq!(b.zone_hits, vec![Timeframe::OneWeek, Timeframe::FourDay]);
        assert_eq!(b.zone_points(), 2);
    }

    #[test]
    fn divergences_add_one_each() {
        let b = score_breakdown(
            105.0,
            &timeframes(),
            &rsi(50.0, true, false, false),
            &Macd { divergence: true },
            &th(),
        );
        assert_eq!(b.divergence_points, 2);
        assert_eq!(b.total(), 2);
    }

    #[test]
    fn non_extreme_overbought_adds_one() {
        let s = score(
            136.0,
            &timeframes(),
            &rsi(70.0, true, true, false),
            &Macd::default(),
            &th(),
        );
        assert_eq!(s, 3);
    }

    #[test]
    fn extreme_overbought_uses_low_value() {
        let s = score(
            136.0,
            &timeframes(),
            &rsi(10.0, true, true, false),
            &Macd::default(),
            &th(),
        );
        assert_eq!(s, 4);
    }

    #[test]
    fn extreme_oversold_uses_high_value() {
        let b = score_breakdown(
            105.0,
            &timeframes(),
            &rsi(80.0, false, false, true),
            &Macd::default(),
            &th(),
        );
        assert_eq!(b.rsi_points, 2);
    }

    #[test]
    fn conventional_oversold_reading_is_not_extreme() {
        let b = score_breakdown(
            105.0,
            &timeframes(),
            &rsi(20.0, false, false, true),
            &Macd::default(),
            &th(),
        );
        assert_eq!(b.rsi_points, 1);
    }

    #[test]
    fn extreme_bonus_is_not_stacked() {
        // Both flags set with a value that is extreme for overbought only.
        let b = score_breakdown(
            10.0,
            &timeframes(),
            &rsi(10.0, false, true, true),
            &Macd::default(),
            &th(),
        );
        assert_eq!(b.rsi_points, 2);
    }

    #[test]
    fn custom_thresholds_apply() {
        let thresholds = RsiThresholds {
            extreme_overbought_below: 80.0,
            extreme_oversold_above: 20.0,
        };
        let b = score_breakdown(
            105.0,
            &timeframes(),
            &rsi(70.0, false, true, false),
            &Macd::default(),
            &thresholds,
        );
        assert_eq!(b.rsi_points, 2);
    }

    #[test]
    fn every_component_firing_scores_seven() {
        let tf = Timeframes {
            two_week: Range::new(100.0, 100.0),
            one_week: Range::new(100.0, 100.0),
            four_day: Range::new(100.0, 100.0),
        };
        let s = score(
            100.0,
            &tf,
            &rsi(5.0, true, true, false),
            &Macd { divergence: true },
            &th(),
        );
        assert_eq!(s, 7);
    }
}
