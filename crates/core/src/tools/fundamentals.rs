//! # Fundamentals Tool
//!
//! Exposes the market-data collaborator's fundamentals to the stock researcher.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::ToolError;
use crate::market::MarketData;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FundamentalsArgs {
    /// The stock ticker symbol
    pub ticker: String,
}

pub struct FundamentalsTool {
    market: Arc<dyn MarketData>,
}

impl FundamentalsTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    pub async fn analyze(&self, args: FundamentalsArgs) -> Result<serde_json::Value, ToolError> {
        let ticker = args.ticker.trim().to_uppercase();
        let fundamentals = self
            .market
            .fundamentals(&ticker)
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        serde_json::to_value(fundamentals).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::market::{Fundamentals, HistoryRange, MarketDataError, PricePoint};

    struct FixedMarket;

    #[async_trait]
    impl MarketData for FixedMarket {
        async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
            if ticker == "NONE" {
                return Err(MarketDataError::NoData(ticker.to_string()));
            }
            Ok(Fundamentals {
                ticker: ticker.to_string(),
                pe_ratio: Some(21.5),
                ..Fundamentals::default()
            })
        }

        async fn daily_closes(
            &self,
            _ticker: &str,
            _range: HistoryRange,
        ) -> Result<Vec<PricePoint>, MarketDataError> {
            Ok(Vec::new())
        }
    }

    fn ticker(symbol: &str) -> FundamentalsArgs {
        FundamentalsArgs {
            ticker: symbol.to_string(),
        }
    }

    #[tokio::test]
    async fn test_normalizes_ticker() {
        let tool = FundamentalsTool::new(Arc::new(FixedMarket));
        let out = tool.analyze(ticker(" aapl ")).await.unwrap();
        assert_eq!(out["ticker"], "AAPL");
        assert_eq!(out["pe_ratio"], 21.5);
    }

    #[tokio::test]
    async fn test_market_error_is_wrapped() {
        let tool = FundamentalsTool::new(Arc::new(FixedMarket));
        let err = tool.analyze(ticker("none")).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
        assert!(err.to_string().contains("NONE"));
    }
}
