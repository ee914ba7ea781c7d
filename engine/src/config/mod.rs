pub mod settings;

pub use settings::{BotSettings, CandleSourceKind, ExchangeSettings, TradingSettings};
