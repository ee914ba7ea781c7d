// Operator commands typed into the bot's console.
use std::str::FromStr;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Stop,
    Status,
    Debug(bool),
    /// One-off analysis of a pair, outside the polling cycle.
    Analyze(String),
}

impl FromStr for BotCommand {
    type Err = EngineError;

    /// Accepts `/start`, `/stop`, `/status`, `/debug on|off` and `/analyze PAIR`.
    /// The leading slash is optional and the command word is case-insensitive.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let word = parts
            .next()
            .ok_or_else(|| EngineError::CommandError("empty command".to_string()))?;
        let word = word.trim_start_matches('/').to_lowercase();
        let arg = parts.next();

        match (word.as_str(), arg) {
            ("start", _) => Ok(BotCommand::Start),
            ("stop", _) => Ok(BotCommand::Stop),
            ("status", _) => Ok(BotCommand::Status),
            ("debug", Some(flag)) => match flag.to_lowercase().as_str() {
                "on" | "true" | "1" => Ok(BotCommand::Debug(true)),
                "off" | "false" | "0" => Ok(BotCommand::Debug(false)),
                other => Err(EngineError::CommandError(format!("debug expects on/off, got '{}'", other))),
            },
            ("debug", None) => Err(EngineError::CommandError("debug expects on/off".to_string())),
            ("analyze", Some(pair)) => Ok(BotCommand::Analyze(pair.to_uppercase())),
            ("analyze", None) => Err(EngineError::CommandError("analyze expects a pair, e.g. /analyze BTCUSDT".to_string())),
            (other, _) => Err(EngineError::CommandError(format!("unknown command '{}'", other))),
        }
    }
}
