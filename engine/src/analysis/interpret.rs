// Turns raw indicator series into boolean capability flags for the scorer.
//
// Every interpreter accepts short or empty series and reports all-false flags
// until enough warm-up data exists.
use shared::models::{Candle, IndicatorSet, MacdPoint, StochRsiPoint};

use super::scoring::ScoringConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacdFlags {
    pub is_building: bool,
    pub is_strong_building: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StochRsiFlags {
    pub is_turning_up: bool,
    pub is_overbought: bool,
    pub is_oversold: bool,
    pub bullish_divergence: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AoFlags {
    pub is_building: bool,
    pub is_above_zero: bool,
    pub is_below_zero: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsiFlags {
    pub is_oversold: bool,
    pub is_overbought: bool,
    pub is_rising: bool,
    pub is_falling: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorFlags {
    pub macd: MacdFlags,
    pub stoch_rsi: StochRsiFlags,
    pub ao: AoFlags,
    pub rsi: RsiFlags,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThresholds {
    /// Wide bars tighten the bands to 25/75, calm bars use 30/70.
    pub fn for_volatility(volatility: f64, config: &ScoringConfig) -> Self {
        if volatility > config.high_volatility {
            RsiThresholds { oversold: 25.0, overbought: 75.0 }
        } else {
            RsiThresholds { oversold: 30.0, overbought: 70.0 }
        }
    }
}

/// `(high - low) / open` of a bar; 0.0 when the open is not positive.
pub fn candle_volatility(candle: &Candle) -> f64 {
    if candle.open > 0.0 {
        candle.range() / candle.open
    } else {
        0.0
    }
}

/// Number of strictly rising steps at the end of the series.
pub fn trailing_rises(values: &[f64]) -> usize {
    values.windows(2).rev().take_while(|w| w[1] > w[0]).count()
}

const STOCH_TURN_LEVEL: f64 = 30.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_DIVERGENCE_LOOKBACK: usize = 5;

pub fn interpret_macd(series: &[MacdPoint], price: f64, config: &ScoringConfig) -> MacdFlags {
    let Some(last) = series.last() else {
        return MacdFlags::default();
    };
    let histogram: Vec<f64> = series.iter().map(|p| p.histogram).collect();
    let rises = trailing_rises(&histogram);
    let magnitude = last.histogram.abs();

    MacdFlags {
        is_building: rises >= 3 && magnitude > price.abs() * config.macd_building_threshold,
        is_strong_building: rises >= 4 && magnitude > price.abs() * config.macd_strong_threshold,
    }
}

pub fn interpret_stoch_rsi(series: &[StochRsiPoint]) -> StochRsiFlags {
    let Some(last) = series.last() else {
        return StochRsiFlags::default();
    };
    let rising = series.len() >= 2 && last.k > series[series.len() - 2].k;
    let recent = &series[series.len().saturating_sub(STOCH_DIVERGENCE_LOOKBACK)..];

    StochRsiFlags {
        is_turning_up: rising && last.k > STOCH_TURN_LEVEL,
        is_overbought: last.k > STOCH_OVERBOUGHT,
        is_oversold: last.k < STOCH_OVERSOLD,
        bullish_divergence: rising && recent.iter().any(|p| p.k < STOCH_TURN_LEVEL),
    }
}

pub fn interpret_ao(series: &[f64]) -> AoFlags {
    let Some(&last) = series.last() else {
        return AoFlags::default();
    };
    AoFlags {
        is_building: trailing_rises(series) >= 3,
        is_above_zero: last > 0.0,
        is_below_zero: last < 0.0,
    }
}

/// Rising/falling needs a move of at least `min_move` points to count.
pub fn interpret_rsi(series: &[f64], thresholds: RsiThresholds, min_move: f64) -> RsiFlags {
    let Some(&last) = series.last() else {
        return RsiFlags::default();
    };
    let delta = if series.len() >= 2 {
        last - series[series.len() - 2]
    } else {
        0.0
    };

    RsiFlags {
        is_oversold: last < thresholds.oversold,
        is_overbought: last > thresholds.overbought,
        is_rising: series.len() >= 2 && delta >= min_move,
        is_falling: series.len() >= 2 && -delta >= min_move,
    }
}

/// All flags for one timeframe. `None` indicators (library failure or not
/// enough candles) give all-false flags.
pub fn interpret_indicators(
    indicators: Option<&IndicatorSet>,
    latest: &Candle,
    config: &ScoringConfig,
) -> IndicatorFlags {
    let Some(indicators) = indicators else {
        return IndicatorFlags::default();
    };
    let thresholds = RsiThresholds::for_volatility(candle_volatility(latest), config);

    IndicatorFlags {
        macd: interpret_macd(&indicators.macd, latest.close, config),
        stoch_rsi: interpret_stoch_rsi(&indicators.stoch_rsi),
        ao: interpret_ao(&indicators.ao),
        rsi: interpret_rsi(&indicators.rsi, thresholds, config.rsi_min_move),
    }
}
