// Append-only CSV record of every consensus decision.
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use shared::models::ConsensusResult;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

const HEADER: [&str; 7] = [
    "timestamp",
    "pair",
    "consensus",
    "normalized_buy",
    "normalized_sell",
    "timeframes_analyzed",
    "signals",
];

#[derive(Debug, Clone)]
pub struct ConsensusLog {
    path: PathBuf,
}

impl ConsensusLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one row, adding the header when the file is new or empty.
    pub fn append(&self, at: DateTime<Utc>, pair: &str, result: &ConsensusResult) -> Result<(), EngineError> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            at.to_rfc3339(),
            pair.to_string(),
            result.consensus_signal.to_string(),
            format!("{:.4}", result.normalized_buy_score),
            format!("{:.4}", result.normalized_sell_score),
            result.timeframes_analyzed.to_string(),
            signal_summary(result),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

/// `1h:BUY|4h:HOLD` style summary of the per-timeframe signals.
pub fn signal_summary(result: &ConsensusResult) -> String {
    result
        .signals
        .iter()
        .map(|s| format!("{}:{}", s.timeframe, s.signal))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_consensus;
    use crate::analysis::test_support::analysis_with_scores;
    use shared::models::{Signal, TimeFrame, TimeframeSignal};
    use std::fs;

    fn sample_result() -> ConsensusResult {
        let entry = |tf: &str, signal: Signal, buy: f64| TimeframeSignal {
            timeframe: TimeFrame::new(tf),
            signal,
            weight: 1.0,
            details: analysis_with_scores(signal, buy, 0.0),
        };
        build_consensus(vec![entry("1h", Signal::Buy, 8.0), entry("4h", Signal::Hold, 2.0)])
    }

    #[test]
    fn test_signal_summary() {
        assert_eq!(signal_summary(&sample_result()), "1h:BUY|4h:HOLD");
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = ConsensusLog::new(dir.path().join("consensus.csv"));
        let result = sample_result();
        log.append(Utc::now(), "BTCUSDT", &result).unwrap();
        log.append(Utc::now(), "ETHUSDT", &result).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,pair,consensus"));
        assert!(lines[1].contains(",BTCUSDT,HOLD,5.0000,0.0000,2,1h:BUY|4h:HOLD"));
        assert!(lines[2].contains(",ETHUSDT,"));
    }
}
