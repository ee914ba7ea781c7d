// Technical indicators module.
//
// All indicator math comes from the `ta` crate. This module only feeds it
// candles, composes the few indicators `ta` lacks (StochRSI, AO, ADX) from its
// primitives, and trims each series' warm-up prefix.
pub mod ao;
pub mod ema;
pub mod range;
pub mod rsi;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{Candle, IndicatorSet};
use tracing::warn;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub stoch_k_smoothing: usize,
    pub stoch_d_smoothing: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub ao_fast: usize,
    pub ao_slow: usize,
    pub atr_period: usize,
    pub ema_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: 14,
            stoch_period: 14,
            stoch_k_smoothing: 3,
            stoch_d_smoothing: 3,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            ao_fast: 5,
            ao_slow: 34,
            atr_period: 14,
            ema_period: 20,
        }
    }
}

// Common trait for indicator providers
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    /// `None` when the candles cannot support the indicators at all.
    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorSet>;
}

pub struct TaIndicators {
    params: IndicatorParams,
}

impl TaIndicators {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    fn try_calculate(&self, candles: &[Candle]) -> Result<IndicatorSet, EngineError> {
        let p = &self.params;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let rsi = rsi::rsi(&closes, p.rsi_period)?;
        let stoch_rsi = rsi::stoch_rsi(&rsi, p.stoch_period, p.stoch_k_smoothing, p.stoch_d_smoothing)?;

        Ok(IndicatorSet {
            stoch_rsi,
            rsi,
            macd: ema::macd(&closes, p.macd_fast, p.macd_slow, p.macd_signal)?,
            adx: range::adx(candles, p.adx_period)?,
            ao: ao::awesome_oscillator(candles, p.ao_fast, p.ao_slow)?,
            atr: range::atr(candles, p.atr_period)?,
            ema: ema::ema(&closes, p.ema_period)?,
        })
    }
}

impl Default for TaIndicators {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}

impl IndicatorCalculator for TaIndicators {
    fn name(&self) -> &str {
        "ta"
    }

    fn parameters(&self) -> Value {
        serde_json::to_value(&self.params).unwrap_or(Value::Null)
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorSet> {
        if candles.len() <= self.params.rsi_period {
            return None;
        }
        match self.try_calculate(candles) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!(error = %e, candles = candles.len(), "indicator calculation failed");
                None
            }
        }
    }
}

/// Indicator set for `candles` with the given periods.
pub fn compute_indicators(candles: &[Candle], params: &IndicatorParams) -> Option<IndicatorSet> {
    TaIndicators::new(params.clone()).calculate(candles)
}

/// Drops the first `warmup` values; the rest stay aligned to the input suffix.
pub(crate) fn skip_warmup<T>(mut values: Vec<T>, warmup: usize) -> Vec<T> {
    if warmup >= values.len() {
        Vec::new()
    } else {
        values.split_off(warmup)
    }
}

pub(crate) fn invalid_period(indicator: &str, err: impl std::fmt::Debug) -> EngineError {
    EngineError::IndicatorError(format!("{} rejected its parameters: {:?}", indicator, err))
}
