// Single-timeframe pipeline: trend + patterns + indicator flags -> signal.
use shared::models::{Analysis, Candle, IndicatorSet, PredictiveMetrics, TimeframeAnalysis};
use tracing::debug;

use super::interpret::interpret_indicators;
use super::patterns::detect_candlestick_patterns;
use super::scoring::{classify, score, PriceMetrics, ScoringConfig};
use super::trend::analyze_trend;

/// Runs the full scoring pipeline for one timeframe. Missing indicators only
/// remove their own contributions; too few candles yields `InsufficientData`.
pub fn analyze_single_timeframe(
    indicators: Option<&IndicatorSet>,
    candles: &[Candle],
    window: usize,
    config: &ScoringConfig,
) -> Analysis<TimeframeAnalysis> {
    let trend = match analyze_trend(candles, window) {
        Analysis::Ready(trend) => trend,
        Analysis::InsufficientData { required, available } => {
            return Analysis::InsufficientData { required, available };
        }
    };
    let Some(metrics) = PriceMetrics::from_candles(candles) else {
        return Analysis::InsufficientData { required: 2, available: candles.len() };
    };
    let latest = &candles[candles.len() - 1];

    let patterns = detect_candlestick_patterns(candles);
    let flags = interpret_indicators(indicators, latest, config);
    let scored = score(&trend, &flags, &patterns, &metrics, config);
    let signal = classify(scored.buy_score, scored.sell_score, trend.price_trend, &config.thresholds);

    debug!(
        window,
        ?signal,
        buy_score = scored.buy_score,
        sell_score = scored.sell_score,
        price_trend = ?trend.price_trend,
        potential_move = ?trend.potential_move,
        volatility = metrics.volatility,
        has_indicators = indicators.is_some(),
        "timeframe scored"
    );

    Analysis::Ready(TimeframeAnalysis {
        signal,
        trend,
        predictive_metrics: PredictiveMetrics {
            price_position: metrics.price_position,
            volume_change: metrics.volume_change,
            patterns,
            buy_score: scored.buy_score,
            sell_score: scored.sell_score,
        },
    })
}
