// Candle acquisition: exchange REST, kline CSV exports and the in-memory store.
pub mod binance;
pub mod candle_source;
pub mod csv_parser;
pub mod market_data;
pub mod rate_limiter;

pub use binance::BinanceCandleSource;
pub use candle_source::{CandleSource, StoreCandleSource};
pub use market_data::MarketDataStore;
