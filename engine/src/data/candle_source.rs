// Where the bot gets its candles from.
use async_trait::async_trait;
use shared::models::{Candle, TimeFrame};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::csv_parser::KlineCsvParser;
use super::market_data::MarketDataStore;
use crate::error::EngineError;

#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    /// Candles for one pair and timeframe, oldest first.
    async fn fetch_candles(&self, pair: &str, timeframe: &TimeFrame) -> Result<Vec<Candle>, EngineError>;
}

/// Serves candles from a [`MarketDataStore`], usually filled from CSV exports.
pub struct StoreCandleSource {
    store: Arc<RwLock<MarketDataStore>>,
    limit: usize,
}

impl StoreCandleSource {
    pub fn new(store: Arc<RwLock<MarketDataStore>>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Loads `{data_dir}/{PAIR}-{tf}.csv` for every pair/timeframe combination.
    /// Missing files are skipped with a warning; unreadable ones are errors.
    pub fn from_csv_dir(
        data_dir: impl AsRef<Path>,
        pairs: &[String],
        timeframes: &[TimeFrame],
        limit: usize,
    ) -> Result<Self, EngineError> {
        let data_dir = data_dir.as_ref();
        let mut store = MarketDataStore::new();

        for pair in pairs {
            for timeframe in timeframes {
                let path = data_dir.join(format!("{}-{}.csv", pair, timeframe));
                if !path.exists() {
                    warn!(%pair, %timeframe, path = %path.display(), "no candle export found");
                    continue;
                }
                let candles = KlineCsvParser::load_candles_from_csv(&path)?;
                let stored = store.add_candles(pair, timeframe.clone(), candles);
                info!(%pair, %timeframe, candles = stored, "loaded candles from CSV");
            }
        }

        Ok(Self::new(Arc::new(RwLock::new(store)), limit))
    }

    pub fn store(&self) -> Arc<RwLock<MarketDataStore>> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl CandleSource for StoreCandleSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_candles(&self, pair: &str, timeframe: &TimeFrame) -> Result<Vec<Candle>, EngineError> {
        let store = self.store.read().await;
        match store.get_candles(pair, timeframe, Some(self.limit)) {
            Some(candles) if !candles.is_empty() => Ok(candles),
            _ => Err(EngineError::MarketDataError(format!("No candles for {} {}", pair, timeframe))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn kline_rows(count: usize) -> String {
        (0..count)
            .map(|i| {
                let open_time = 1_700_000_000_000_i64 + i as i64 * 3_600_000;
                let close = 100.0 + i as f64;
                format!("{},{},{},{},{},{},{}", open_time, close - 0.5, close + 1.0, close - 1.0, close, 10.0, open_time + 3_599_999)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_from_csv_dir_serves_latest_candles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BTCUSDT-1h.csv"), kline_rows(30)).unwrap();

        let pairs = vec!["BTCUSDT".to_string()];
        let timeframes = vec![TimeFrame::new("1h"), TimeFrame::new("4h")];
        let source = StoreCandleSource::from_csv_dir(dir.path(), &pairs, &timeframes, 20).unwrap();

        let candles = source.fetch_candles("BTCUSDT", &TimeFrame::new("1h")).await.unwrap();
        assert_eq!(candles.len(), 20);
        assert_eq!(candles.last().unwrap().close, 129.0);
    }

    #[tokio::test]
    async fn test_missing_series_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = vec!["BTCUSDT".to_string()];
        let source = StoreCandleSource::from_csv_dir(dir.path(), &pairs, &[TimeFrame::new("4h")], 20).unwrap();
        let err = source.fetch_candles("BTCUSDT", &TimeFrame::new("4h")).await.unwrap_err();
        assert!(matches!(err, EngineError::MarketDataError(_)));
    }
}
