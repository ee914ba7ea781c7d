// Price/volume trend classification over a candle window.
use shared::models::{
    Analysis, Candle, Confidence, PotentialMove, PriceTrend, TrendResult, VolumeTrend,
};
use shared::utils::{mean, pct_change, pct_changes};

/// Fewer candles than this cannot be classified.
pub const MIN_TREND_CANDLES: usize = 5;
/// Candles used for the short "recent pattern" series behind acceleration.
pub const RECENT_PATTERN_CANDLES: usize = 8;

const STRONG_ACCELERATION: f64 = 0.15;
const ACCELERATION: f64 = 0.10;
const PRICE_CHANGE_THRESHOLD: f64 = 0.20;
const VOLUME_CHANGE_THRESHOLD: f64 = 5.0;

/// Classifies the last `window` candles. The window is clamped to the series
/// length and widened to [`MIN_TREND_CANDLES`] when the series allows it.
pub fn analyze_trend(candles: &[Candle], window: usize) -> Analysis<TrendResult> {
    let window = window.max(MIN_TREND_CANDLES).min(candles.len());
    if window < MIN_TREND_CANDLES {
        return Analysis::InsufficientData {
            required: MIN_TREND_CANDLES,
            available: candles.len(),
        };
    }

    let slice = &candles[candles.len() - window..];
    let closes: Vec<f64> = slice.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = slice.iter().map(|c| c.volume).collect();

    let recent = &closes[closes.len().saturating_sub(RECENT_PATTERN_CANDLES)..];
    let price_acceleration = acceleration(&pct_changes(recent));

    let avg_price_change = mean(&pct_changes(&closes));
    let avg_volume_change = mean(&pct_changes(&volumes));
    let overall_price_change = pct_change(closes[0], closes[closes.len() - 1]);

    let volume_trend = classify_volume_trend(avg_volume_change, &volumes);
    let (price_trend, potential_move, confidence) =
        classify_price_trend(price_acceleration, avg_price_change, volume_trend);

    Analysis::Ready(TrendResult {
        price_trend,
        volume_trend,
        potential_move,
        price_acceleration,
        avg_price_change,
        avg_volume_change,
        overall_price_change,
        confidence,
    })
}

/// Mean of the first differences of a percentage-change series.
pub fn acceleration(changes: &[f64]) -> f64 {
    let diffs: Vec<f64> = changes.windows(2).map(|w| w[1] - w[0]).collect();
    mean(&diffs)
}

pub fn classify_volume_trend(avg_volume_change: f64, volumes: &[f64]) -> VolumeTrend {
    let last3 = &volumes[volumes.len().saturating_sub(3)..];
    let rising = last3.len() == 3 && last3[0] < last3[1] && last3[1] < last3[2];
    let falling = last3.len() == 3 && last3[0] > last3[1] && last3[1] > last3[2];

    if avg_volume_change > VOLUME_CHANGE_THRESHOLD {
        if rising {
            VolumeTrend::StrongIncreasing
        } else {
            VolumeTrend::Increasing
        }
    } else if avg_volume_change < -VOLUME_CHANGE_THRESHOLD {
        if falling {
            VolumeTrend::StrongDecreasing
        } else {
            VolumeTrend::Decreasing
        }
    } else {
        VolumeTrend::Stable
    }
}

/// First matching row wins; the ranges overlap on purpose.
pub fn classify_price_trend(
    acceleration: f64,
    avg_price_change: f64,
    volume_trend: VolumeTrend,
) -> (PriceTrend, PotentialMove, Confidence) {
    if acceleration > STRONG_ACCELERATION {
        (PriceTrend::Bullish, PotentialMove::StrongAcceleration, Confidence::High)
    } else if acceleration > ACCELERATION {
        (PriceTrend::Bullish, PotentialMove::Acceleration, Confidence::Medium)
    } else if avg_price_change > PRICE_CHANGE_THRESHOLD && volume_trend == VolumeTrend::StrongIncreasing {
        (PriceTrend::Bullish, PotentialMove::StrongVolumeSupport, Confidence::High)
    } else if avg_price_change > PRICE_CHANGE_THRESHOLD && volume_trend.is_increasing() {
        (PriceTrend::Bullish, PotentialMove::VolumeSupported, Confidence::Medium)
    } else if avg_price_change < -PRICE_CHANGE_THRESHOLD && volume_trend == VolumeTrend::StrongDecreasing {
        (PriceTrend::Bearish, PotentialMove::StrongReversal, Confidence::High)
    } else if avg_price_change < -PRICE_CHANGE_THRESHOLD {
        (PriceTrend::Bearish, PotentialMove::ReversalPossible, Confidence::Medium)
    } else {
        (PriceTrend::Sideways, PotentialMove::Consolidation, Confidence::Low)
    }
}
