// Weighted buy/sell scoring and signal classification.
//
// The weight table and thresholds are plain configuration. Older heuristic
// variants are presets of the same table rather than separate code paths.
use serde::{Deserialize, Serialize};
use shared::models::{
    Candle, PatternFlags, PotentialMove, PriceTrend, Score, Signal, TrendResult,
};
use shared::utils::pct_change;

use super::interpret::{candle_volatility, IndicatorFlags};

/// Points added to a side's score when the named condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    // Buy side
    pub macd_building: f64,
    pub macd_strong_building: f64,
    pub stoch_rsi_turning_up: f64,
    pub stoch_rsi_bullish_divergence: f64,
    pub rsi_oversold: f64,
    pub rsi_rising: f64,
    pub ao_building: f64,
    pub ao_above_zero: f64,
    pub pre_breakout: f64,
    pub bottoming: f64,
    pub gap_up: f64,
    pub bullish_engulfing: f64,
    pub acceleration: f64,
    pub volume_support: f64,
    pub increasing_volume: f64,
    pub three_white_soldiers: f64,
    // Sell side
    pub rsi_overbought: f64,
    pub stoch_rsi_overbought: f64,
    pub rsi_falling: f64,
    pub ao_below_zero: f64,
    pub deceleration: f64,
    pub reversal: f64,
    pub gap_down: f64,
    pub bearish_engulfing: f64,
    pub three_black_crows: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            macd_building: 1.5,
            macd_strong_building: 2.5,
            stoch_rsi_turning_up: 1.2,
            stoch_rsi_bullish_divergence: 3.0,
            rsi_oversold: 2.0,
            rsi_rising: 1.5,
            ao_building: 2.0,
            ao_above_zero: 1.5,
            pre_breakout: 2.5,
            bottoming: 2.0,
            gap_up: 1.5,
            bullish_engulfing: 1.5,
            acceleration: 2.0,
            volume_support: 1.5,
            increasing_volume: 1.5,
            three_white_soldiers: 2.5,
            rsi_overbought: 2.2,
            stoch_rsi_overbought: 2.5,
            rsi_falling: 1.5,
            ao_below_zero: 1.5,
            deceleration: 2.0,
            reversal: 1.5,
            gap_down: 1.5,
            bearish_engulfing: 2.0,
            three_black_crows: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalThresholds {
    pub strong: f64,
    pub ordinary: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        SignalThresholds { strong: 10.0, ordinary: 7.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub thresholds: SignalThresholds,
    /// Latest-bar `(high - low) / open` above which RSI bands tighten.
    pub high_volatility: f64,
    /// MACD histogram magnitude, as a fraction of price, for "building".
    pub macd_building_threshold: f64,
    pub macd_strong_threshold: f64,
    /// RSI points a bar must move to count as rising or falling.
    pub rsi_min_move: f64,
    /// Latest volume change (percent) that confirms breakouts and bottoms.
    pub volume_confirmation: f64,
    /// Latest volume change (percent) that confirms a gap.
    pub gap_volume_confirmation: f64,
    pub breakout_position: f64,
    pub bottoming_position: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weights: ScoringWeights::default(),
            thresholds: SignalThresholds::default(),
            high_volatility: 0.02,
            macd_building_threshold: 0.0001,
            macd_strong_threshold: 0.0003,
            rsi_min_move: 2.0,
            volume_confirmation: 5.0,
            gap_volume_confirmation: 10.0,
            breakout_position: 0.7,
            bottoming_position: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPreset {
    #[default]
    Latest,
    /// Superseded 5/3 thresholds.
    Legacy,
}

impl ScoringConfig {
    pub fn preset(preset: ScoringPreset) -> Self {
        match preset {
            ScoringPreset::Latest => ScoringConfig::default(),
            ScoringPreset::Legacy => ScoringConfig {
                thresholds: SignalThresholds { strong: 5.0, ordinary: 3.0 },
                ..ScoringConfig::default()
            },
        }
    }
}

/// Bar-level inputs to the scorer derived from the last two candles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMetrics {
    pub price_position: f64,
    /// Percent change of the latest volume against the previous bar.
    pub volume_change: f64,
    pub close: f64,
    pub prev_close: f64,
    pub volatility: f64,
}

impl PriceMetrics {
    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        let n = candles.len();
        if n < 2 {
            return None;
        }
        let (prev, last) = (&candles[n - 2], &candles[n - 1]);
        Some(PriceMetrics {
            price_position: last.close_position(),
            volume_change: pct_change(prev.volume, last.volume),
            close: last.close,
            prev_close: prev.close,
            volatility: candle_volatility(last),
        })
    }
}

/// Sums the weights of every condition that holds. Scores only grow.
pub fn score(
    trend: &TrendResult,
    flags: &IndicatorFlags,
    patterns: &PatternFlags,
    metrics: &PriceMetrics,
    config: &ScoringConfig,
) -> Score {
    let w = &config.weights;
    let mut buy = 0.0;
    let mut sell = 0.0;

    // Momentum indicators
    if flags.macd.is_strong_building {
        buy += w.macd_strong_building;
    } else if flags.macd.is_building {
        buy += w.macd_building;
    }
    if flags.stoch_rsi.is_turning_up {
        buy += w.stoch_rsi_turning_up;
    }
    if flags.stoch_rsi.bullish_divergence {
        buy += w.stoch_rsi_bullish_divergence;
    }
    if flags.rsi.is_oversold {
        buy += w.rsi_oversold;
    }
    if flags.rsi.is_rising {
        buy += w.rsi_rising;
    }
    if flags.ao.is_building {
        buy += w.ao_building;
    }
    if flags.ao.is_above_zero {
        buy += w.ao_above_zero;
    }

    if flags.rsi.is_overbought {
        sell += w.rsi_overbought;
    }
    if flags.stoch_rsi.is_overbought {
        sell += w.stoch_rsi_overbought;
    }
    if flags.rsi.is_falling {
        sell += w.rsi_falling;
    }
    if flags.ao.is_below_zero {
        sell += w.ao_below_zero;
    }

    // Bar structure
    let volume_confirmed = metrics.volume_change > config.volume_confirmation;
    if metrics.price_position > config.breakout_position && volume_confirmed {
        buy += w.pre_breakout;
    }
    if metrics.price_position < config.bottoming_position
        && volume_confirmed
        && metrics.close > metrics.prev_close
    {
        buy += w.bottoming;
    }
    let gap_confirmed = metrics.volume_change > config.gap_volume_confirmation;
    if patterns.gap_up && gap_confirmed {
        buy += w.gap_up;
    }
    if patterns.gap_down && gap_confirmed {
        sell += w.gap_down;
    }

    // Candlestick patterns
    if patterns.bullish_engulfing {
        buy += w.bullish_engulfing;
    }
    if patterns.is_three_white_soldiers {
        buy += w.three_white_soldiers;
    }
    if patterns.bearish_engulfing {
        sell += w.bearish_engulfing;
    }
    if patterns.is_three_black_crows {
        sell += w.three_black_crows;
    }

    // Trend shape
    match trend.potential_move {
        PotentialMove::StrongAcceleration => buy += w.acceleration * 1.5,
        PotentialMove::Acceleration => buy += w.acceleration,
        PotentialMove::StrongVolumeSupport => buy += w.volume_support * 1.5,
        PotentialMove::VolumeSupported => buy += w.volume_support,
        PotentialMove::StrongReversal => sell += w.reversal * 1.5,
        PotentialMove::ReversalPossible => sell += w.reversal,
        PotentialMove::Consolidation => {}
    }
    if trend.volume_trend.is_increasing() {
        buy += w.increasing_volume;
    }
    if trend.price_acceleration < -0.15 {
        sell += w.deceleration * 1.5;
    } else if trend.price_acceleration < -0.10 {
        sell += w.deceleration;
    }

    Score { buy_score: buy, sell_score: sell }
}

/// Buy is checked first and only fires in a bullish or sideways trend.
/// Sell has no trend gate.
pub fn classify(
    buy_score: f64,
    sell_score: f64,
    price_trend: PriceTrend,
    thresholds: &SignalThresholds,
) -> Signal {
    let buy_allowed = matches!(price_trend, PriceTrend::Bullish | PriceTrend::Sideways);

    if buy_allowed && buy_score >= thresholds.strong {
        Signal::StrongBuy
    } else if buy_allowed && buy_score >= thresholds.ordinary {
        Signal::Buy
    } else if sell_score >= thresholds.strong {
        Signal::StrongSell
    } else if sell_score >= thresholds.ordinary {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
