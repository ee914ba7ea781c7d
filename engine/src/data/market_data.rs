// In-memory candle store keyed by pair and timeframe.
use shared::models::{Candle, TimeFrame};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MarketDataStore {
    data: HashMap<String, HashMap<TimeFrame, Vec<Candle>>>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges candles, keeping the series sorted by open time. A candle with an
    /// open time already present replaces the stored one.
    pub fn add_candles(&mut self, pair: &str, timeframe: TimeFrame, new_candles: Vec<Candle>) -> usize {
        let series = self.data.entry(pair.to_string()).or_default().entry(timeframe).or_default();

        // Stable sort keeps the newer copy first, so dedup keeps it.
        let mut merged = new_candles;
        merged.append(series);
        merged.sort_by_key(|c| c.open_time);
        merged.dedup_by_key(|c| c.open_time);

        *series = merged;
        series.len()
    }

    /// The most recent `limit` candles (all when `None`), oldest first.
    pub fn get_candles(&self, pair: &str, timeframe: &TimeFrame, limit: Option<usize>) -> Option<Vec<Candle>> {
        let candles = self.data.get(pair)?.get(timeframe)?;
        let start = limit.map_or(0, |n| candles.len().saturating_sub(n));
        Some(candles[start..].to_vec())
    }

    pub fn pairs(&self) -> Vec<&str> {
        let mut pairs: Vec<&str> = self.data.keys().map(String::as_str).collect();
        pairs.sort_unstable();
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
