// The polling loop: fetch candles, score every pair, log and optionally trade.
use chrono::Utc;
use futures::future::join_all;
use shared::models::{Candle, ConsensusResult, IndicatorSet, TimeFrame};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::commands::BotCommand;
use super::consensus_log::{signal_summary, ConsensusLog};
use super::order_executor::{OrderExecutor, OrderSide};
use crate::analysis::{aggregate_timeframes, ScoringConfig};
use crate::config::BotSettings;
use crate::data::CandleSource;
use crate::error::EngineError;
use crate::indicators::{IndicatorCalculator, TaIndicators};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub running: bool,
    pub debug: bool,
    pub cycles: u64,
}

/// Consensus for one pair plus the latest close of its shortest timeframe.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    pub consensus: ConsensusResult,
    pub last_price: Option<f64>,
}

pub struct TradingBot<S: CandleSource, E: OrderExecutor> {
    settings: BotSettings,
    scoring: ScoringConfig,
    indicators: TaIndicators,
    source: S,
    executor: E,
    consensus_log: Option<ConsensusLog>,
    state: RunState,
}

impl<S: CandleSource, E: OrderExecutor> TradingBot<S, E> {
    pub fn new(settings: BotSettings, source: S, executor: E) -> Self {
        let scoring = settings.scoring_config();
        let indicators = TaIndicators::new(settings.indicators.clone());
        let consensus_log = settings.consensus_log.clone().map(ConsensusLog::new);
        let state = RunState { running: true, debug: settings.debug, cycles: 0 };
        Self { settings, scoring, indicators, source, executor, consensus_log, state }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Fetches every configured timeframe concurrently and scores the pair.
    /// Failed fetches are dropped; the pair fails only when none succeed.
    pub async fn analyze_pair(&self, pair: &str) -> Result<PairAnalysis, EngineError> {
        let fetches = self.settings.timeframes.iter().map(move |timeframe| async move {
            (timeframe, self.source.fetch_candles(pair, timeframe).await)
        });

        let mut all_candles: HashMap<TimeFrame, Vec<Candle>> = HashMap::new();
        for (timeframe, result) in join_all(fetches).await {
            match result {
                Ok(candles) if !candles.is_empty() => {
                    all_candles.insert(timeframe.clone(), candles);
                }
                Ok(_) => warn!(%pair, %timeframe, "no candles returned"),
                Err(e) => warn!(%pair, %timeframe, error = %e, transient = e.is_transient(), "candle fetch failed"),
            }
        }
        if all_candles.is_empty() {
            return Err(EngineError::MarketDataError(format!("No candles for any timeframe of {}", pair)));
        }

        let all_indicators: HashMap<TimeFrame, IndicatorSet> = all_candles
            .iter()
            .filter_map(|(timeframe, candles)| {
                self.indicators.calculate(candles).map(|set| (timeframe.clone(), set))
            })
            .collect();

        let last_price = all_candles
            .iter()
            .min_by(|(a, _), (b, _)| a.hours().total_cmp(&b.hours()))
            .and_then(|(_, candles)| candles.last())
            .map(|c| c.close);

        let consensus = aggregate_timeframes(&all_indicators, &all_candles, &self.settings.analysis, &self.scoring);
        Ok(PairAnalysis { consensus, last_price })
    }

    /// Analyzes one pair, records the decision and trades on it when enabled.
    pub async fn process_pair(&mut self, pair: &str) -> Result<ConsensusResult, EngineError> {
        let PairAnalysis { consensus, last_price } = self.analyze_pair(pair).await?;

        info!(
            %pair,
            consensus = %consensus.consensus_signal,
            buy = consensus.normalized_buy_score,
            sell = consensus.normalized_sell_score,
            timeframes = consensus.timeframes_analyzed,
            "consensus"
        );
        if self.state.debug {
            for entry in &consensus.signals {
                let metrics = &entry.details.predictive_metrics;
                info!(
                    %pair,
                    timeframe = %entry.timeframe,
                    signal = %entry.signal,
                    buy_score = metrics.buy_score,
                    sell_score = metrics.sell_score,
                    price_trend = ?entry.details.trend.price_trend,
                    potential_move = ?entry.details.trend.potential_move,
                    "timeframe detail"
                );
            }
        }

        if let Some(log) = &self.consensus_log {
            if let Err(e) = log.append(Utc::now(), pair, &consensus) {
                warn!(path = %log.path().display(), error = %e, "could not append consensus log");
            }
        }

        if self.settings.trading.enabled {
            self.maybe_trade(pair, &consensus, last_price).await;
        }
        Ok(consensus)
    }

    async fn maybe_trade(&self, pair: &str, consensus: &ConsensusResult, last_price: Option<f64>) {
        let Some(side) = OrderSide::for_signal(consensus.consensus_signal, self.settings.trading.strong_only) else {
            return;
        };
        let Some(price) = last_price else {
            warn!(%pair, %side, "no reference price, order skipped");
            return;
        };
        if let Err(e) = self
            .executor
            .place_market_order(pair, side, self.settings.trading.quote_amount, price)
            .await
        {
            error!(%pair, %side, error = %e, "order placement failed");
        }
    }

    /// One pass over all pairs. Returns how many pairs produced a consensus.
    pub async fn run_cycle(&mut self) -> usize {
        self.state.cycles += 1;
        debug!(cycle = self.state.cycles, pairs = self.settings.pairs.len(), "cycle started");

        let pairs = self.settings.pairs.clone();
        let mut processed = 0;
        for (idx, pair) in pairs.iter().enumerate() {
            match self.process_pair(pair).await {
                Ok(_) => processed += 1,
                Err(e) => warn!(%pair, error = %e, "pair skipped"),
            }
            if self.settings.pair_delay_ms > 0 && idx + 1 < pairs.len() {
                tokio::time::sleep(Duration::from_millis(self.settings.pair_delay_ms)).await;
            }
        }
        processed
    }

    /// Applies an operator command and returns a one-line reply.
    pub async fn handle_command(&mut self, command: BotCommand) -> String {
        match command {
            BotCommand::Start => {
                self.state.running = true;
                "polling started".to_string()
            }
            BotCommand::Stop => {
                self.state.running = false;
                "polling stopped".to_string()
            }
            BotCommand::Status => format!(
                "running={} debug={} cycles={} pairs={} timeframes={}",
                self.state.running,
                self.state.debug,
                self.state.cycles,
                self.settings.pairs.join(","),
                self.settings.timeframes.iter().map(TimeFrame::as_str).collect::<Vec<_>>().join(","),
            ),
            BotCommand::Debug(enabled) => {
                self.state.debug = enabled;
                format!("debug {}", if enabled { "on" } else { "off" })
            }
            BotCommand::Analyze(pair) => match self.analyze_pair(&pair).await {
                Ok(analysis) => format!(
                    "{} {} buy={:.2} sell={:.2} [{}]",
                    pair,
                    analysis.consensus.consensus_signal,
                    analysis.consensus.normalized_buy_score,
                    analysis.consensus.normalized_sell_score,
                    signal_summary(&analysis.consensus),
                ),
                Err(e) => format!("{} analysis failed: {}", pair, e),
            },
        }
    }

    /// Polls on `poll_interval_secs` while running and serves commands until
    /// the command channel closes.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<BotCommand>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.settings.poll_interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            pairs = self.settings.pairs.len(),
            timeframes = self.settings.timeframes.len(),
            source = self.source.name(),
            "trading loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick(), if self.state.running => {
                    let processed = self.run_cycle().await;
                    info!(cycle = self.state.cycles, processed, "cycle finished");
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        let reply = self.handle_command(command).await;
                        info!("{}", reply);
                    }
                    None => {
                        info!("command channel closed");
                        break;
                    }
                },
            }
        }
    }
}
