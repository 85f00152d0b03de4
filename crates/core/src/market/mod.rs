//! # Market Data
//!
//! Price history and company fundamentals behind the `MarketData` trait.
//! The production source is Yahoo Finance; tests plug in fixed data.
//!
//! ## Modules
//!
//! - `yahoo` - Yahoo Finance chart and quote-summary client
//! - `indicators` - Moving averages and MACD
//! - `chart` - SVG technical-analysis chart

pub mod chart;
pub mod indicators;
pub mod yahoo;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chart::{ChartError, TaChart};
pub use yahoo::YahooFinance;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("no market data for '{0}'")]
    NoData(String),

    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data provider returned status {0}")]
    Status(u16),

    #[error("unexpected market data payload: {0}")]
    Malformed(String),
}

/// Company fundamentals. Absent metrics stay `None` so the analyst can omit them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Fundamentals {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    #[serde(rename = "52_week_high")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Option<f64>,
    pub current_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub analyst_recommendation: Option<String>,
    pub target_price: Option<f64>,
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// History window accepted by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRange {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl HistoryRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = MarketDataError;

    /// Accepts provider codes ("1y") and the long spellings the UI sends ("1year")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" | "1day" => Ok(Self::OneDay),
            "5d" | "5days" => Ok(Self::FiveDays),
            "1mo" | "1month" => Ok(Self::OneMonth),
            "3mo" | "3months" => Ok(Self::ThreeMonths),
            "6mo" | "6months" => Ok(Self::SixMonths),
            "1y" | "1year" => Ok(Self::OneYear),
            "2y" | "2years" => Ok(Self::TwoYears),
            "5y" | "5years" => Ok(Self::FiveYears),
            "max" => Ok(Self::Max),
            other => Err(MarketDataError::Malformed(format!(
                "unsupported period '{}'",
                other
            ))),
        }
    }
}

/// Source of prices and fundamentals
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError>;

    /// Daily closes, oldest first
    async fn daily_closes(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, MarketDataError>;
}
