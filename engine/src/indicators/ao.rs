// Awesome Oscillator: SMA(fast) - SMA(slow) of bar midpoints
use shared::models::Candle;
use ta::indicators::SimpleMovingAverage;
use ta::Next;

use super::{invalid_period, skip_warmup};
use crate::error::EngineError;

pub fn awesome_oscillator(candles: &[Candle], fast: usize, slow: usize) -> Result<Vec<f64>, EngineError> {
    let mut fast_sma = SimpleMovingAverage::new(fast).map_err(|e| invalid_period("AO fast", e))?;
    let mut slow_sma = SimpleMovingAverage::new(slow).map_err(|e| invalid_period("AO slow", e))?;

    let values = candles
        .iter()
        .map(|c| {
            let mid = c.midpoint();
            fast_sma.next(mid) - slow_sma.next(mid)
        })
        .collect();
    Ok(skip_warmup(values, fast.max(slow) - 1))
}
