// Everything around the scoring engine that the running bot needs.
pub mod commands;
pub mod consensus_log;
pub mod order_executor;
pub mod trading_loop;

pub use commands::BotCommand;
pub use consensus_log::ConsensusLog;
pub use order_executor::{OrderExecutor, OrderReceipt, OrderSide, PaperExecutor};
pub use trading_loop::{RunState, TradingBot};
