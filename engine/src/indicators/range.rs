// Range-based indicators: Average True Range and Average Directional Index
use shared::models::Candle;
use ta::indicators::{AverageTrueRange, ExponentialMovingAverage};
use ta::{Close, High, Low, Next};

use super::{invalid_period, skip_warmup};
use crate::error::EngineError;

/// Lets `ta` read OHLC fields straight from a candle.
struct Bar<'a>(&'a Candle);

impl High for Bar<'_> {
    fn high(&self) -> f64 {
        self.0.high
    }
}

impl Low for Bar<'_> {
    fn low(&self) -> f64 {
        self.0.low
    }
}

impl Close for Bar<'_> {
    fn close(&self) -> f64 {
        self.0.close
    }
}

pub fn atr(candles: &[Candle], period: usize) -> Result<Vec<f64>, EngineError> {
    let mut atr = AverageTrueRange::new(period).map_err(|e| invalid_period("ATR", e))?;
    let values = candles.iter().map(|c| atr.next(&Bar(c))).collect();
    Ok(skip_warmup(values, period))
}

/// Wilder smoothing of period `n` is an EMA of period `2n - 1`, so ADX is
/// assembled from `ta` EMAs over directional movement and true range.
pub fn adx(candles: &[Candle], period: usize) -> Result<Vec<f64>, EngineError> {
    if period == 0 {
        return Err(EngineError::IndicatorError("ADX period must be greater than 0".to_string()));
    }
    let smoothing = 2 * period - 1;
    let mut true_range = AverageTrueRange::new(smoothing).map_err(|e| invalid_period("ADX", e))?;
    let mut plus_dm = ExponentialMovingAverage::new(smoothing).map_err(|e| invalid_period("ADX", e))?;
    let mut minus_dm = ExponentialMovingAverage::new(smoothing).map_err(|e| invalid_period("ADX", e))?;
    let mut adx = ExponentialMovingAverage::new(smoothing).map_err(|e| invalid_period("ADX", e))?;

    let values = candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            let up = cur.high - prev.high;
            let down = prev.low - cur.low;
            let plus = plus_dm.next(if up > down && up > 0.0 { up } else { 0.0 });
            let minus = minus_dm.next(if down > up && down > 0.0 { down } else { 0.0 });
            let tr = true_range.next(&Bar(cur));

            let (plus_di, minus_di) = if tr > 0.0 {
                (100.0 * plus / tr, 100.0 * minus / tr)
            } else {
                (0.0, 0.0)
            };
            let di_sum = plus_di + minus_di;
            let dx = if di_sum > 0.0 { 100.0 * (plus_di - minus_di).abs() / di_sum } else { 0.0 };
            adx.next(dx)
        })
        .collect();
    Ok(skip_warmup(values, smoothing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::utils::millis_to_utc;

    fn create_candle(close: f64) -> Candle {
        Candle {
            open_time: millis_to_utc(0),
            open: close - 0.5, high: close + 1.0, low: close - 1.0, close,
            volume: 1.0,
            close_time: millis_to_utc(0),
            quote_volume: 0.0, trades: 0,
            taker_buy_base_volume: 0.0, taker_buy_quote_volume: 0.0,
        }
    }

    #[test]
    fn test_atr_constant_range() {
        let candles: Vec<Candle> = (1..=30).map(|i| create_candle(100.0 + i as f64)).collect();
        let results = atr(&candles, 14).unwrap();
        assert_eq!(results.len(), 16);
        for value in results {
            assert!((value - 2.0).abs() < 1e-9, "ATR {} should equal the bar range", value);
        }
    }

    #[test]
    fn test_adx_strong_trend() {
        let candles: Vec<Candle> = (1..=60).map(|i| create_candle(100.0 + i as f64)).collect();
        let results = adx(&candles, 14).unwrap();
        assert_eq!(results.len(), 59 - 27);
        assert!(*results.last().unwrap() > 50.0);
    }

    #[test]
    fn test_adx_zero_period() {
        assert!(adx(&[], 0).is_err());
    }

    #[test]
    fn test_adx_short_input() {
        let candles: Vec<Candle> = (1..=3).map(|i| create_candle(i as f64)).collect();
        assert!(adx(&candles, 14).unwrap().is_empty());
    }
}
