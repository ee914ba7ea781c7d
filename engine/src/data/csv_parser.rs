// Loader for exchange kline CSV exports.
//
// Rows follow the REST kline layout: openTime, open, high, low, close, volume,
// closeTime, quoteVolume, trades, takerBuyBase, takerBuyQuote, ignore.
// A leading header row is skipped; numeric fields that fail to parse become 0.
use anyhow::{anyhow, Result};
use csv::ReaderBuilder;
use shared::models::Candle;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

pub struct KlineCsvParser;

impl KlineCsvParser {
    pub fn load_candles_from_csv(file_path: impl AsRef<Path>) -> Result<Vec<Candle>> {
        let path = file_path.as_ref();
        let file = File::open(path).map_err(|e| anyhow!("Failed to open CSV file '{}': {}", path.display(), e))?;
        let candles = Self::parse_candles(BufReader::new(file))?;
        debug!(path = %path.display(), count = candles.len(), "loaded kline CSV");
        Ok(candles)
    }

    pub fn parse_candles<R: Read>(reader: R) -> Result<Vec<Candle>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut candles = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", idx + 1, e))?;
            let fields: Vec<&str> = record.iter().collect();

            if idx == 0 && is_header(&fields) {
                continue;
            }
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }
            let candle = Candle::from_fields(&fields).map_err(|e| anyhow!("Invalid kline at line {}: {}", idx + 1, e))?;
            candles.push(candle);
        }
        Ok(candles)
    }
}

fn is_header(fields: &[&str]) -> bool {
    fields.first().map_or(false, |f| f.parse::<f64>().is_err())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_candles_with_header() {
        let csv_content = "\
open_time,open,high,low,close,volume,close_time,quote_volume,trades,taker_base,taker_quote,ignore
1700000000000,100.5,101.0,99.5,100.8,12.5,1700003599999,1260.0,42,6.0,604.8,0
1700003600000,100.8,102.0,100.1,101.9,15.0,1700007199999,1525.0,51,8.0,815.2,0";
        let tmp_file = create_test_csv(csv_content);
        let candles = KlineCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.5);
        assert_eq!(candles[0].close, 100.8);
        assert_eq!(candles[0].trades, 42);
        assert_eq!(candles[0].open_time.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(candles[1].high, 102.0);
        assert_eq!(candles[1].taker_buy_quote_volume, 815.2);
    }

    #[test]
    fn test_load_candles_without_header() {
        let tmp_file = create_test_csv("1700000000000,1,2,0.5,1.5,10");
        let candles = KlineCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].volume, 10.0);
        assert_eq!(candles[0].quote_volume, 0.0);
    }

    #[test]
    fn test_unparseable_numbers_become_zero() {
        let tmp_file = create_test_csv("1700000000000,abc,2,0.5,1.5,10");
        let candles = KlineCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();
        assert_eq!(candles[0].open, 0.0);
        assert!(candles[0].open.is_finite());
    }

    #[test]
    fn test_short_row_is_error() {
        let tmp_file = create_test_csv("1700000000000,1,2,0.5");
        let result = KlineCsvParser::load_candles_from_csv(tmp_file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid kline at line 1"));
    }

    #[test]
    fn test_missing_file() {
        let result = KlineCsvParser::load_candles_from_csv("does/not/exist.csv");
        assert!(result.unwrap_err().to_string().contains("Failed to open CSV file"));
    }
}
