// Signal bot entry point
use anyhow::Result;
use signal_engine::config::settings::DEFAULT_CONFIG_PATH;
use signal_engine::config::{BotSettings, CandleSourceKind};
use signal_engine::data::{BinanceCandleSource, CandleSource, StoreCandleSource};
use signal_engine::services::{BotCommand, OrderExecutor, PaperExecutor, TradingBot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = BotSettings::load(&config_path)?;
    info!(
        config = %config_path,
        pairs = ?settings.pairs,
        source = ?settings.exchange.source,
        trading = settings.trading.enabled,
        "Starting signal bot..."
    );

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(read_commands(tx));

    match settings.exchange.source {
        CandleSourceKind::Binance => {
            let exchange = &settings.exchange;
            let source = BinanceCandleSource::new(&exchange.base_url, exchange.candle_limit, exchange.requests_per_minute)?;
            run_bot(TradingBot::new(settings, source, PaperExecutor::new()), rx).await;
        }
        CandleSourceKind::Csv => {
            let source = StoreCandleSource::from_csv_dir(
                &settings.exchange.data_dir,
                &settings.pairs,
                &settings.timeframes,
                settings.exchange.candle_limit as usize,
            )?;
            run_bot(TradingBot::new(settings, source, PaperExecutor::new()), rx).await;
        }
    }
    Ok(())
}

/// Forwards console lines to the bot until stdin closes.
async fn read_commands(tx: mpsc::Sender<BotCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match line.parse::<BotCommand>() {
                Ok(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "ignored console input"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}

async fn run_bot<S: CandleSource, E: OrderExecutor>(mut bot: TradingBot<S, E>, rx: mpsc::Receiver<BotCommand>) {
    tokio::select! {
        _ = bot.run(rx) => {}
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received"),
    }
    info!(cycles = bot.state().cycles, "signal bot stopped");
}
