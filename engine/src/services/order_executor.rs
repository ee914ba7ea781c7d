// Order placement. Only paper fills are implemented.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Signal;
use std::fmt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side for an actionable signal. With `strong_only`, plain BUY/SELL are ignored.
    pub fn for_signal(signal: Signal, strong_only: bool) -> Option<Self> {
        if strong_only && !signal.is_strong() {
            return None;
        }
        if signal.is_buy() {
            Some(OrderSide::Buy)
        } else if signal.is_sell() {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub pair: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub price: f64,
    pub quote_amount: f64,
    pub filled_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Spends `quote_amount` of the quote asset at market. `reference_price` is
    /// the latest known close.
    async fn place_market_order(
        &self,
        pair: &str,
        side: OrderSide,
        quote_amount: f64,
        reference_price: f64,
    ) -> Result<OrderReceipt, EngineError>;
}

/// Fills every market order at the reference price and remembers it.
#[derive(Debug, Default)]
pub struct PaperExecutor {
    fills: Mutex<Vec<OrderReceipt>>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fills(&self) -> Vec<OrderReceipt> {
        self.fills.lock().await.clone()
    }
}

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn place_market_order(
        &self,
        pair: &str,
        side: OrderSide,
        quote_amount: f64,
        reference_price: f64,
    ) -> Result<OrderReceipt, EngineError> {
        if !(reference_price > 0.0) {
            return Err(EngineError::OrderError(format!("No usable price for {}: {}", pair, reference_price)));
        }
        if !(quote_amount > 0.0) {
            return Err(EngineError::OrderError(format!("Quote amount must be positive, got {}", quote_amount)));
        }

        let receipt = OrderReceipt {
            order_id: Uuid::new_v4().to_string(),
            pair: pair.to_string(),
            side,
            quantity: quote_amount / reference_price,
            price: reference_price,
            quote_amount,
            filled_at: Utc::now(),
        };
        tracing::info!(
            order_id = %receipt.order_id,
            %pair,
            %side,
            quantity = receipt.quantity,
            price = receipt.price,
            "Paper market order filled"
        );
        self.fills.lock().await.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_for_signal() {
        assert_eq!(OrderSide::for_signal(Signal::StrongBuy, true), Some(OrderSide::Buy));
        assert_eq!(OrderSide::for_signal(Signal::Buy, true), None);
        assert_eq!(OrderSide::for_signal(Signal::Buy, false), Some(OrderSide::Buy));
        assert_eq!(OrderSide::for_signal(Signal::Sell, false), Some(OrderSide::Sell));
        assert_eq!(OrderSide::for_signal(Signal::Hold, false), None);
    }

    #[tokio::test]
    async fn test_paper_market_buy() {
        let executor = PaperExecutor::new();
        let receipt = executor.place_market_order("BTCUSDT", OrderSide::Buy, 100.0, 50.0).await.unwrap();
        assert_eq!(receipt.price, 50.0);
        assert!((receipt.quantity - 2.0).abs() < 1e-12);
        assert!(Uuid::parse_str(&receipt.order_id).is_ok());
        assert_eq!(executor.fills().await.len(), 1);
    }

    #[tokio::test]
    async fn test_paper_order_needs_price() {
        let executor = PaperExecutor::new();
        let err = executor.place_market_order("BTCUSDT", OrderSide::Sell, 100.0, 0.0).await.unwrap_err();
        assert!(err.to_string().contains("No usable price"));
        assert!(executor.fills().await.is_empty());
    }

    #[tokio::test]
    async fn test_paper_order_needs_amount() {
        let executor = PaperExecutor::new();
        assert!(executor.place_market_order("BTCUSDT", OrderSide::Buy, -5.0, 10.0).await.is_err());
    }
}
