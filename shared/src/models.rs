use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::utils::{coerce_f64, coerce_i64, millis_to_utc, parse_f64_lenient};

/// One exchange kline. Rows arrive as 12 positional fields:
/// openTime, open, high, low, close, volume, closeTime, quoteVolume,
/// tradeCount, takerBuyBaseVolume, takerBuyQuoteVolume, ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

/// Minimum positional fields a kline row must carry (through volume).
pub const MIN_ROW_FIELDS: usize = 6;

impl Candle {
    /// Builds a candle from a JSON kline row. Numeric fields may be strings or
    /// numbers; anything unparseable becomes 0.
    pub fn from_row(row: &[Value]) -> anyhow::Result<Self> {
        if row.len() < MIN_ROW_FIELDS {
            anyhow::bail!("kline row has {} fields, expected at least {}", row.len(), MIN_ROW_FIELDS);
        }
        let num = |idx: usize| row.get(idx).map(coerce_f64).unwrap_or(0.0);
        let int = |idx: usize| row.get(idx).map(coerce_i64).unwrap_or(0);

        Ok(Candle {
            open_time: millis_to_utc(int(0)),
            open: num(1),
            high: num(2),
            low: num(3),
            close: num(4),
            volume: num(5),
            close_time: millis_to_utc(int(6)),
            quote_volume: num(7),
            trades: int(8).max(0) as u64,
            taker_buy_base_volume: num(9),
            taker_buy_quote_volume: num(10),
        })
    }

    /// Same as [`Candle::from_row`] for textual rows (CSV exports).
    pub fn from_fields(fields: &[&str]) -> anyhow::Result<Self> {
        if fields.len() < MIN_ROW_FIELDS {
            anyhow::bail!("kline row has {} fields, expected at least {}", fields.len(), MIN_ROW_FIELDS);
        }
        let num = |idx: usize| fields.get(idx).map(|s| parse_f64_lenient(s)).unwrap_or(0.0);
        let int = |idx: usize| num(idx) as i64;

        Ok(Candle {
            open_time: millis_to_utc(int(0)),
            open: num(1),
            high: num(2),
            low: num(3),
            close: num(4),
            volume: num(5),
            close_time: millis_to_utc(int(6)),
            quote_volume: num(7),
            trades: int(8).max(0) as u64,
            taker_buy_base_volume: num(9),
            taker_buy_quote_volume: num(10),
        })
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Where the close sits inside the bar's range, 0.0 at the low and 1.0 at
    /// the high. A zero-range bar reports 0.5.
    pub fn close_position(&self) -> f64 {
        let range = self.range();
        if range > 0.0 {
            (self.close - self.low) / range
        } else {
            0.5
        }
    }
}

/// A candle interval label such as "1h", "4h", "1d" or a bare hour count ("2").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeFrame(String);

impl TimeFrame {
    pub fn new(label: impl Into<String>) -> Self {
        TimeFrame(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Duration in hours. Unparseable labels count as one hour.
    pub fn hours(&self) -> f64 {
        parse_timeframe_hours(&self.0)
    }

    /// Exchange interval string. Bare hour counts gain an `h` suffix.
    pub fn interval(&self) -> String {
        let label = self.0.trim().to_lowercase();
        if label.parse::<u32>().is_ok() {
            format!("{}h", label)
        } else {
            label
        }
    }
}

impl From<&str> for TimeFrame {
    fn from(label: &str) -> Self {
        TimeFrame::new(label)
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts `N` (hours), `Nh` and `Nd`. Anything else, including zero, is 1 hour.
pub fn parse_timeframe_hours(label: &str) -> f64 {
    let label = label.trim().to_lowercase();
    let (digits, multiplier) = if let Some(n) = label.strip_suffix('h') {
        (n, 1.0)
    } else if let Some(n) = label.strip_suffix('d') {
        (n, 24.0)
    } else {
        (label.as_str(), 1.0)
    };

    match digits.parse::<u32>() {
        Ok(n) if n > 0 => n as f64 * multiplier,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTrend {
    Bullish,
    Bearish,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeTrend {
    StrongIncreasing,
    Increasing,
    Stable,
    Decreasing,
    StrongDecreasing,
}

impl VolumeTrend {
    pub fn is_increasing(self) -> bool {
        matches!(self, VolumeTrend::Increasing | VolumeTrend::StrongIncreasing)
    }

    pub fn is_decreasing(self) -> bool {
        matches!(self, VolumeTrend::Decreasing | VolumeTrend::StrongDecreasing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PotentialMove {
    StrongAcceleration,
    Acceleration,
    StrongVolumeSupport,
    VolumeSupported,
    StrongReversal,
    ReversalPossible,
    Consolidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Signal {
    pub fn is_buy(self) -> bool {
        matches!(self, Signal::Buy | Signal::StrongBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Signal::Sell | Signal::StrongSell)
    }

    pub fn is_strong(self) -> bool {
        matches!(self, Signal::StrongBuy | Signal::StrongSell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG_BUY",
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG_SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an analysis step that needs a minimum amount of data.
/// Callers must check for `InsufficientData` before reading the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum Analysis<T> {
    Ready(T),
    InsufficientData { required: usize, available: usize },
}

impl<T> Analysis<T> {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Analysis::InsufficientData { .. })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Analysis::Ready(value) => Some(value),
            Analysis::InsufficientData { .. } => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Analysis::Ready(value) => Some(value),
            Analysis::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub price_trend: PriceTrend,
    pub volume_trend: VolumeTrend,
    pub potential_move: PotentialMove,
    pub price_acceleration: f64,
    /// Percent.
    pub avg_price_change: f64,
    /// Percent.
    pub avg_volume_change: f64,
    /// Percent, first to last close of the window.
    pub overall_price_change: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFlags {
    pub is_three_white_soldiers: bool,
    pub is_three_black_crows: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub gap_up: bool,
    pub gap_down: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub buy_score: f64,
    pub sell_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveMetrics {
    pub price_position: f64,
    /// Percent change of the latest volume against the previous bar.
    pub volume_change: f64,
    pub patterns: PatternFlags,
    pub buy_score: f64,
    pub sell_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeAnalysis {
    pub signal: Signal,
    pub trend: TrendResult,
    pub predictive_metrics: PredictiveMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeSignal {
    pub timeframe: TimeFrame,
    pub signal: Signal,
    pub weight: f64,
    pub details: TimeframeAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub consensus_signal: Signal,
    pub signals: Vec<TimeframeSignal>,
    pub normalized_buy_score: f64,
    pub normalized_sell_score: f64,
    pub timeframes_analyzed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochRsiPoint {
    pub k: f64,
    pub d: f64,
}

/// Indicator series for one candle series. Every series is aligned to a
/// suffix of the candles and may be shorter (or empty) during warm-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub rsi: Vec<f64>,
    pub stoch_rsi: Vec<StochRsiPoint>,
    pub macd: Vec<MacdPoint>,
    pub adx: Vec<f64>,
    pub ao: Vec<f64>,
    pub atr: Vec<f64>,
    pub ema: Vec<f64>,
}

/// Last element of each series, absent when a series is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub stoch_rsi: Option<StochRsiPoint>,
    pub macd: Option<MacdPoint>,
    pub adx: Option<f64>,
    pub ao: Option<f64>,
    pub atr: Option<f64>,
    pub ema: Option<f64>,
}

impl IndicatorSet {
    pub fn current(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: self.rsi.last().copied(),
            stoch_rsi: self.stoch_rsi.last().copied(),
            macd: self.macd.last().copied(),
            adx: self.adx.last().copied(),
            ao: self.ao.last().copied(),
            atr: self.atr.last().copied(),
            ema: self.ema.last().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candle_from_row_mixed_types() {
        let row = vec![
            json!(1_700_000_000_000i64), json!("100.5"), json!(101.0), json!("99.5"), json!("100.9"),
            json!("1234.5"), json!(1_700_003_599_999i64), json!("124000.1"), json!(42),
            json!("600.2"), json!("60300.7"), json!("0"),
        ];
        let candle = Candle::from_row(&row).unwrap();
        assert_eq!(candle.open, 100.5);
        assert_eq!(candle.high, 101.0);
        assert_eq!(candle.close, 100.9);
        assert_eq!(candle.volume, 1234.5);
        assert_eq!(candle.trades, 42);
        assert_eq!(candle.open_time.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_candle_from_row_invalid_numbers_become_zero() {
        let row = vec![json!(0), json!("abc"), json!(null), json!("1.0"), json!("NaN"), json!({})];
        let candle = Candle::from_row(&row).unwrap();
        assert_eq!(candle.open, 0.0);
        assert_eq!(candle.high, 0.0);
        assert_eq!(candle.low, 1.0);
        assert_eq!(candle.close, 0.0);
        assert_eq!(candle.volume, 0.0);
    }

    #[test]
    fn test_candle_from_row_too_short() {
        let row = vec![json!(0), json!("1.0")];
        assert!(Candle::from_row(&row).is_err());
    }

    #[test]
    fn test_close_position() {
        let row = vec![json!(0), json!("10"), json!("20"), json!("10"), json!("18"), json!("1")];
        let candle = Candle::from_row(&row).unwrap();
        assert!((candle.close_position() - 0.8).abs() < 1e-12);

        let flat = Candle::from_fields(&["0", "5", "5", "5", "5", "1"]).unwrap();
        assert_eq!(flat.close_position(), 0.5);
    }

    #[test]
    fn test_parse_timeframe_hours() {
        assert_eq!(parse_timeframe_hours("1h"), 1.0);
        assert_eq!(parse_timeframe_hours("4h"), 4.0);
        assert_eq!(parse_timeframe_hours("1d"), 24.0);
        assert_eq!(parse_timeframe_hours("2"), 2.0);
        assert_eq!(parse_timeframe_hours(" 12H "), 12.0);
        assert_eq!(parse_timeframe_hours("15m"), 1.0);
        assert_eq!(parse_timeframe_hours("weekly"), 1.0);
        assert_eq!(parse_timeframe_hours("0h"), 1.0);
    }

    #[test]
    fn test_timeframe_interval() {
        assert_eq!(TimeFrame::new("2").interval(), "2h");
        assert_eq!(TimeFrame::new("1D").interval(), "1d");
    }

    #[test]
    fn test_signal_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&Signal::StrongBuy).unwrap(), "\"STRONG_BUY\"");
        let parsed: Signal = serde_json::from_str("\"STRONG_SELL\"").unwrap();
        assert_eq!(parsed, Signal::StrongSell);
    }

    #[test]
    fn test_insufficient_analysis_round_trip() {
        let analysis: Analysis<TrendResult> = Analysis::InsufficientData { required: 5, available: 1 };
        let text = serde_json::to_string(&analysis).unwrap();
        let back: Analysis<TrendResult> = serde_json::from_str(&text).unwrap();
        assert!(back.is_insufficient());
        assert_eq!(back, analysis);
    }

    #[test]
    fn test_indicator_current_tolerates_empty_series() {
        let set = IndicatorSet { rsi: vec![40.0, 45.0], ..Default::default() };
        let current = set.current();
        assert_eq!(current.rsi, Some(45.0));
        assert_eq!(current.macd, None);
        assert_eq!(current.stoch_rsi, None);
    }
}
