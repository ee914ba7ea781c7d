// Relative Strength Index and Stochastic RSI, computed by `ta`
use shared::models::StochRsiPoint;
use ta::indicators::{FastStochastic, RelativeStrengthIndex, SimpleMovingAverage};
use ta::Next;

use super::{invalid_period, skip_warmup};
use crate::error::EngineError;

/// RSI values from the `period`-th close onward.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    let mut rsi = RelativeStrengthIndex::new(period).map_err(|e| invalid_period("RSI", e))?;
    let values = closes.iter().map(|&c| rsi.next(c)).collect();
    Ok(skip_warmup(values, period))
}

/// Fast stochastic of the RSI series; %K is smoothed by an SMA and %D is an
/// SMA of %K. Both lines are trimmed to the same length.
pub fn stoch_rsi(
    rsi_values: &[f64],
    period: usize,
    k_smoothing: usize,
    d_smoothing: usize,
) -> Result<Vec<StochRsiPoint>, EngineError> {
    let mut stoch = FastStochastic::new(period).map_err(|e| invalid_period("StochRSI", e))?;
    let mut k_sma = SimpleMovingAverage::new(k_smoothing).map_err(|e| invalid_period("StochRSI %K", e))?;
    let mut d_sma = SimpleMovingAverage::new(d_smoothing).map_err(|e| invalid_period("StochRSI %D", e))?;

    let raw: Vec<f64> = rsi_values.iter().map(|&v| stoch.next(v)).collect();
    let raw = skip_warmup(raw, period - 1);
    let k: Vec<f64> = raw.iter().map(|&v| k_sma.next(v)).collect();
    let k = skip_warmup(k, k_smoothing - 1);

    let points = k
        .iter()
        .map(|&k_value| StochRsiPoint { k: k_value, d: d_sma.next(k_value) })
        .collect();
    Ok(skip_warmup(points, d_smoothing - 1))
}
