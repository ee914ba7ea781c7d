// Candles from the Binance spot REST API.
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::models::{Candle, TimeFrame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::candle_source::CandleSource;
use super::rate_limiter::RateLimiter;
use crate::error::EngineError;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BinanceCandleSource {
    client: Client,
    base_url: String,
    limit: u32,
    limiter: Arc<Mutex<RateLimiter>>,
}

impl BinanceCandleSource {
    pub fn new(base_url: &str, limit: u32, requests_per_minute: u32) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
            limiter: Arc::new(Mutex::new(RateLimiter::new(requests_per_minute))),
        })
    }

    async fn get_klines(&self, pair: &str, interval: &str) -> Result<Value, EngineError> {
        self.limiter.lock().await.acquire().await;

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", pair), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiError { status: status.as_u16(), message: api_error_message(&body) });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(&self, pair: &str, timeframe: &TimeFrame) -> Result<Vec<Candle>, EngineError> {
        let interval = timeframe.interval();
        let payload = self.get_klines(pair, &interval).await?;
        let candles = parse_klines(&payload)?;
        debug!(%pair, %interval, candles = candles.len(), "fetched klines");
        Ok(candles)
    }
}

/// Converts a klines payload (array of positional rows) into candles.
/// Rows too short to describe a bar are dropped.
pub fn parse_klines(payload: &Value) -> Result<Vec<Candle>, EngineError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| EngineError::MarketDataError("klines payload is not an array".to_string()))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let parsed = row
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("kline row is not an array"))
            .and_then(|fields| Candle::from_row(fields));
        match parsed {
            Ok(candle) => candles.push(candle),
            Err(e) => warn!(error = %e, "skipping malformed kline row"),
        }
    }
    Ok(candles)
}

/// Binance error bodies look like `{"code":-1121,"msg":"Invalid symbol."}`.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("msg").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines_mixed_encodings() {
        let payload = json!([
            [1700000000000_i64, "100.5", "101.0", "99.5", "100.8", "12.5", 1700003599999_i64, "1260.0", 42, "6.0", "604.8", "0"],
            [1700003600000_i64, 100.8, 102.0, 100.1, 101.9, 15.0, 1700007199999_i64, 1525.0, 51, 8.0, 815.2, "0"]
        ]);
        let candles = parse_klines(&payload).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.5);
        assert_eq!(candles[0].trades, 42);
        assert_eq!(candles[1].close, 101.9);
        assert_eq!(candles[1].open_time.timestamp_millis(), 1_700_003_600_000);
    }

    #[test]
    fn test_parse_klines_invalid_numbers_become_zero() {
        let payload = json!([[1700000000000_i64, "n/a", "1", "1", "1", "1"]]);
        let candles = parse_klines(&payload).unwrap();
        assert_eq!(candles[0].open, 0.0);
    }

    #[test]
    fn test_parse_klines_skips_short_rows() {
        let payload = json!([[1700000000000_i64, "1", "2"], "garbage"]);
        assert!(parse_klines(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_parse_klines_rejects_objects() {
        let payload = json!({"code": -1121, "msg": "Invalid symbol."});
        assert!(parse_klines(&payload).is_err());
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(api_error_message(r#"{"code":-1121,"msg":"Invalid symbol."}"#), "Invalid symbol.");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let source = BinanceCandleSource::new("https://api.binance.com/", 100, 1200).unwrap();
        assert_eq!(source.base_url, DEFAULT_BASE_URL);
        assert_eq!(source.name(), "binance");
    }
}
