// Bot settings, loaded from a JSON file.
use serde::{Deserialize, Serialize};
use shared::models::TimeFrame;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analysis::{AggregationOptions, ScoringConfig, ScoringPreset};
use crate::data::binance::DEFAULT_BASE_URL;
use crate::error::EngineError;
use crate::indicators::IndicatorParams;

pub const DEFAULT_CONFIG_PATH: &str = "config/bot.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleSourceKind {
    #[default]
    Binance,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangeSettings {
    pub source: CandleSourceKind,
    pub base_url: String,
    pub candle_limit: u32,
    pub requests_per_minute: u32,
    /// Directory holding `{PAIR}-{tf}.csv` exports for the CSV source.
    pub data_dir: PathBuf,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        ExchangeSettings {
            source: CandleSourceKind::Binance,
            base_url: DEFAULT_BASE_URL.to_string(),
            candle_limit: 100,
            requests_per_minute: 1200,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingSettings {
    /// Place paper orders on actionable consensus signals.
    pub enabled: bool,
    pub quote_amount: f64,
    pub strong_only: bool,
}

impl Default for TradingSettings {
    fn default() -> Self {
        TradingSettings { enabled: false, quote_amount: 100.0, strong_only: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    pub pairs: Vec<String>,
    pub timeframes: Vec<TimeFrame>,
    pub poll_interval_secs: u64,
    /// Pause between pairs within one cycle.
    pub pair_delay_ms: u64,
    pub debug: bool,
    pub analysis: AggregationOptions,
    pub scoring_preset: ScoringPreset,
    /// Full override of the preset when present.
    pub scoring: Option<ScoringConfig>,
    pub indicators: IndicatorParams,
    pub exchange: ExchangeSettings,
    pub trading: TradingSettings,
    pub consensus_log: Option<PathBuf>,
}

impl Default for BotSettings {
    fn default() -> Self {
        BotSettings {
            pairs: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            timeframes: ["1h", "2h", "4h", "1d"].into_iter().map(TimeFrame::new).collect(),
            poll_interval_secs: 300,
            pair_delay_ms: 0,
            debug: false,
            analysis: AggregationOptions::default(),
            scoring_preset: ScoringPreset::default(),
            scoring: None,
            indicators: IndicatorParams::default(),
            exchange: ExchangeSettings::default(),
            trading: TradingSettings::default(),
            consensus_log: None,
        }
    }
}

impl BotSettings {
    /// Reads and validates settings. A missing file falls back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let settings = if path.exists() {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            BotSettings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pairs.is_empty() {
            return Err(EngineError::ConfigError("at least one pair is required".to_string()));
        }
        if self.timeframes.is_empty() {
            return Err(EngineError::ConfigError("at least one timeframe is required".to_string()));
        }
        if self.analysis.analysis_window == 0 {
            return Err(EngineError::ConfigError("analysisWindow must be greater than 0".to_string()));
        }
        if let Some((timeframe, weight)) = self.analysis.weights.iter().find(|(_, w)| !(**w > 0.0)) {
            return Err(EngineError::ConfigError(format!("weight for {} must be positive, got {}", timeframe, weight)));
        }
        if self.exchange.candle_limit == 0 {
            return Err(EngineError::ConfigError("candleLimit must be greater than 0".to_string()));
        }
        if self.trading.enabled && !(self.trading.quote_amount > 0.0) {
            return Err(EngineError::ConfigError("trading.quoteAmount must be positive".to_string()));
        }
        Ok(())
    }

    /// The explicit `scoring` block, or the named preset.
    pub fn scoring_config(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_else(|| ScoringConfig::preset(self.scoring_preset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let settings = BotSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.scoring_config(), ScoringConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pairs": ["SOLUSDT"], "timeframes": ["1h", "4h"], "scoringPreset": "legacy",
                "analysis": {{"analysisWindow": 8}}, "exchange": {{"source": "csv", "dataDir": "fixtures"}}}}"#
        )
        .unwrap();

        let settings = BotSettings::load(file.path()).unwrap();
        assert_eq!(settings.pairs, vec!["SOLUSDT"]);
        assert_eq!(settings.timeframes, vec![TimeFrame::new("1h"), TimeFrame::new("4h")]);
        assert_eq!(settings.analysis.analysis_window, 8);
        assert_eq!(settings.analysis.primary_timeframe, TimeFrame::new("2h"));
        assert_eq!(settings.exchange.source, CandleSourceKind::Csv);
        assert_eq!(settings.exchange.data_dir, PathBuf::from("fixtures"));
        assert_eq!(settings.exchange.candle_limit, 100);
        assert_eq!(settings.scoring_config().thresholds.strong, 5.0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = BotSettings::load("no/such/bot.json").unwrap();
        assert_eq!(settings, BotSettings::default());
    }

    #[test]
    fn test_validation_errors() {
        let no_pairs = BotSettings { pairs: Vec::new(), ..Default::default() };
        assert!(matches!(no_pairs.validate(), Err(EngineError::ConfigError(_))));

        let mut bad_weight = BotSettings::default();
        bad_weight.analysis.weights.insert(TimeFrame::new("4h"), 0.0);
        let err = bad_weight.validate().unwrap_err();
        assert!(err.to_string().contains("weight for 4h"));

        let mut zero_window = BotSettings::default();
        zero_window.analysis.analysis_window = 0;
        assert!(zero_window.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(BotSettings::load(file.path()), Err(EngineError::JsonError { .. })));
    }

    #[test]
    fn test_explicit_scoring_overrides_preset() {
        let mut settings = BotSettings { scoring_preset: ScoringPreset::Legacy, ..Default::default() };
        let mut custom = ScoringConfig::default();
        custom.thresholds.strong = 12.0;
        settings.scoring = Some(custom);
        assert_eq!(settings.scoring_config().thresholds.strong, 12.0);
    }
}
