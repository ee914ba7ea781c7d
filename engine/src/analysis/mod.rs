// Signal-scoring engine. Everything here is pure and synchronous: it works on
// fully fetched candles and indicator series and never touches the network.
pub mod aggregator;
pub mod interpret;
pub mod patterns;
pub mod scoring;
pub mod timeframe;
pub mod trend;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{aggregate_timeframes, build_consensus, AggregationOptions};
pub use scoring::{classify, score, ScoringConfig, ScoringPreset};
pub use timeframe::analyze_single_timeframe;
pub use trend::analyze_trend;
