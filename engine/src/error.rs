use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("HTTP error: {source}")]
    HttpError {
        #[from]
        source: reqwest::Error,
    },

    #[error("Exchange API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Market data store error: {0}")]
    MarketDataError(String),

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    #[error("Order placement error: {0}")]
    OrderError(String),

    #[error("Invalid command: {0}")]
    CommandError(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    /// True for failures a later polling cycle may not repeat (network, upstream API).
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::HttpError { .. } => true,
            EngineError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
