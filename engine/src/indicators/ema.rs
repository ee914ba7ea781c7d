// Exponential Moving Average and MACD, computed by `ta`
use shared::models::MacdPoint;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};
use ta::Next;

use super::{invalid_period, skip_warmup};
use crate::error::EngineError;

pub fn ema(closes: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    let mut ema = ExponentialMovingAverage::new(period).map_err(|e| invalid_period("EMA", e))?;
    let values = closes.iter().map(|&c| ema.next(c)).collect();
    Ok(skip_warmup(values, period - 1))
}

/// The first value is usable once both the slow EMA and the signal EMA are warm.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Result<Vec<MacdPoint>, EngineError> {
    let mut macd = MovingAverageConvergenceDivergence::new(fast, slow, signal)
        .map_err(|e| invalid_period("MACD", e))?;
    let values = closes
        .iter()
        .map(|&c| {
            let out = macd.next(c);
            MacdPoint { macd: out.macd, signal: out.signal, histogram: out.histogram }
        })
        .collect();
    Ok(skip_warmup(values, slow + signal - 2))
}
