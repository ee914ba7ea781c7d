// Numeric helpers shared by the candle model and the analysis engine.
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parses a textual number, returning 0.0 for anything unparseable or non-finite.
pub fn parse_f64_lenient(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Exchange payloads mix string and numeric encodings. Non-numeric values
/// coerce to 0.0 so NaN never reaches ratio math downstream.
pub fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_f64_lenient(s),
        _ => 0.0,
    }
}

pub fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| coerce_f64(value) as i64),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or_else(|_| parse_f64_lenient(s) as i64),
        _ => 0,
    }
}

/// Percentage change from `previous` to `current`. A zero (or non-finite)
/// denominator yields 0.0 instead of NaN/Infinity.
pub fn pct_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    let change = (current - previous) / previous * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Step-wise percentage changes of a series: one element shorter than the input.
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| pct_change(w[0], w[1])).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn millis_to_utc(ts_millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts_millis).unwrap_or_default()
}
