// Candle fixtures for the analysis tests.
use shared::models::{
    Candle, Confidence, PatternFlags, PotentialMove, PredictiveMetrics, PriceTrend, Signal,
    TimeframeAnalysis, TrendResult, VolumeTrend,
};
use shared::utils::millis_to_utc;

pub fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle {
        open_time: millis_to_utc(0),
        open,
        high,
        low,
        close,
        volume,
        close_time: millis_to_utc(0),
        quote_volume: close * volume,
        trades: 0,
        taker_buy_base_volume: 0.0,
        taker_buy_quote_volume: 0.0,
    }
}

/// Doji-like bars (open = high = low = close) at constant volume.
pub fn series_from_closes(closes: &[f64], volume: f64) -> Vec<Candle> {
    closes.iter().map(|&c| candle(c, c, c, c, volume)).collect()
}

/// Bars that open at the previous close and close `price_pct` higher, with the
/// close at the high and volume growing by `volume_pct` per bar.
pub fn rising_series(n: usize, price_pct: f64, volume_pct: f64) -> Vec<Candle> {
    let (mut open, mut volume) = (100.0, 1000.0);
    (0..n)
        .map(|_| {
            let close = open * (1.0 + price_pct / 100.0);
            let bar = candle(open, close, open, close, volume);
            open = close;
            volume *= 1.0 + volume_pct / 100.0;
            bar
        })
        .collect()
}

pub fn analysis_with_scores(signal: Signal, buy_score: f64, sell_score: f64) -> TimeframeAnalysis {
    TimeframeAnalysis {
        signal,
        trend: TrendResult {
            price_trend: PriceTrend::Sideways,
            volume_trend: VolumeTrend::Stable,
            potential_move: PotentialMove::Consolidation,
            price_acceleration: 0.0,
            avg_price_change: 0.0,
            avg_volume_change: 0.0,
            overall_price_change: 0.0,
            confidence: Confidence::Low,
        },
        predictive_metrics: PredictiveMetrics {
            price_position: 0.5,
            volume_change: 0.0,
            patterns: PatternFlags::default(),
            buy_score,
            sell_score,
        },
    }
}
