// Multi-timeframe consensus.
//
// Each timeframe is scored on its own with a window scaled to its duration,
// then weighted scores are summed and divided by the total weight of the
// timeframes that produced an analysis.
use serde::{Deserialize, Serialize};
use shared::models::{
    Analysis, Candle, ConsensusResult, IndicatorSet, Signal, TimeFrame, TimeframeSignal,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::scoring::ScoringConfig;
use super::timeframe::analyze_single_timeframe;

/// Extra factor applied to the contribution of a STRONG_ per-timeframe signal.
pub const STRONG_SIGNAL_MULTIPLIER: f64 = 1.5;
pub const CONSENSUS_STRONG_THRESHOLD: f64 = 7.0;
pub const CONSENSUS_THRESHOLD: f64 = 5.0;
/// Weight for timeframes missing from the weight table.
pub const DEFAULT_TIMEFRAME_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregationOptions {
    /// Candle window at the primary timeframe.
    pub analysis_window: usize,
    pub primary_timeframe: TimeFrame,
    pub weights: BTreeMap<TimeFrame, f64>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        let weights = [("1h", 1.0), ("2h", 1.5), ("4h", 2.0), ("1d", 3.0)]
            .into_iter()
            .map(|(tf, w)| (TimeFrame::new(tf), w))
            .collect();
        AggregationOptions {
            analysis_window: 12,
            primary_timeframe: TimeFrame::new("2h"),
            weights,
        }
    }
}

impl AggregationOptions {
    pub fn weight_for(&self, timeframe: &TimeFrame) -> f64 {
        self.weights.get(timeframe).copied().unwrap_or(DEFAULT_TIMEFRAME_WEIGHT)
    }

    /// Primary window scaled by `primary duration / timeframe duration`, rounded up.
    pub fn window_for(&self, timeframe: &TimeFrame) -> usize {
        let scaled = (self.analysis_window as f64 * self.primary_timeframe.hours() / timeframe.hours()).ceil();
        (scaled as usize).max(1)
    }
}

/// Scores every timeframe that has candles and combines the results.
/// Timeframes without candles, or with too few, are left out of the consensus.
pub fn aggregate_timeframes(
    all_indicators: &HashMap<TimeFrame, IndicatorSet>,
    all_candles: &HashMap<TimeFrame, Vec<Candle>>,
    options: &AggregationOptions,
    config: &ScoringConfig,
) -> ConsensusResult {
    let mut timeframes: Vec<&TimeFrame> = all_candles.keys().collect();
    timeframes.sort_by(|a, b| a.hours().total_cmp(&b.hours()).then_with(|| a.cmp(b)));

    let mut entries = Vec::with_capacity(timeframes.len());
    for timeframe in timeframes {
        let candles = &all_candles[timeframe];
        let window = options.window_for(timeframe);
        match analyze_single_timeframe(all_indicators.get(timeframe), candles, window, config) {
            Analysis::Ready(details) => entries.push(TimeframeSignal {
                timeframe: timeframe.clone(),
                signal: details.signal,
                weight: options.weight_for(timeframe),
                details,
            }),
            Analysis::InsufficientData { required, available } => {
                debug!(%timeframe, required, available, "timeframe skipped: insufficient data");
            }
        }
    }

    build_consensus(entries)
}

/// Weighted average of per-timeframe scores, normalized by the summed weights.
pub fn build_consensus(signals: Vec<TimeframeSignal>) -> ConsensusResult {
    let mut weighted_buy = 0.0;
    let mut weighted_sell = 0.0;
    let mut total_weight = 0.0;

    for entry in &signals {
        let multiplier = if entry.signal.is_strong() { STRONG_SIGNAL_MULTIPLIER } else { 1.0 };
        let metrics = &entry.details.predictive_metrics;
        weighted_buy += metrics.buy_score * entry.weight * multiplier;
        weighted_sell += metrics.sell_score * entry.weight * multiplier;
        total_weight += entry.weight;
    }

    let (normalized_buy_score, normalized_sell_score) = if total_weight > 0.0 {
        (weighted_buy / total_weight, weighted_sell / total_weight)
    } else {
        (0.0, 0.0)
    };

    ConsensusResult {
        consensus_signal: classify_consensus(normalized_buy_score, normalized_sell_score),
        timeframes_analyzed: signals.len(),
        signals,
        normalized_buy_score,
        normalized_sell_score,
    }
}

pub fn classify_consensus(buy: f64, sell: f64) -> Signal {
    if buy > CONSENSUS_STRONG_THRESHOLD {
        Signal::StrongBuy
    } else if buy > CONSENSUS_THRESHOLD {
        Signal::Buy
    } else if sell > CONSENSUS_STRONG_THRESHOLD {
        Signal::StrongSell
    } else if sell > CONSENSUS_THRESHOLD {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
