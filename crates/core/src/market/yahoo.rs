//! Yahoo Finance client.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

use super::{Fundamentals, HistoryRange, MarketData, MarketDataError, PricePoint};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_ENDPOINT: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str =
    "price,summaryProfile,summaryDetail,defaultKeyStatistics,financialData";

pub struct YahooFinance {
    client: reqwest::Client,
}

impl YahooFinance {
    pub fn new() -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; llm-toolbox/1.0)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    async fn get_json(&self, url: &str) -> Result<Value, MarketDataError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::NoData(url.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        let url = format!(
            "{}/{}?modules={}",
            SUMMARY_ENDPOINT,
            urlencoding::encode(ticker),
            SUMMARY_MODULES
        );
        let body = self.get_json(&url).await?;
        parse_quote_summary(ticker, &body)
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let url = format!(
            "{}/{}?range={}&interval=1d",
            CHART_ENDPOINT,
            urlencoding::encode(ticker),
            range
        );
        let body = self.get_json(&url).await?;
        let points = parse_chart(&body)?;
        if points.is_empty() {
            return Err(MarketDataError::NoData(ticker.to_string()));
        }
        tracing::debug!(ticker = %ticker, points = points.len(), "Fetched daily closes");
        Ok(points)
    }
}

/// Pair timestamps with closes, skipping days the provider left null
fn parse_chart(body: &Value) -> Result<Vec<PricePoint>, MarketDataError> {
    let result = body
        .pointer("/chart/result/0")
        .ok_or_else(|| MarketDataError::Malformed("missing chart result".into()))?;

    let timestamps = result
        .get("timestamp")
        .and_then(|t| t.as_array())
        .cloned()
        .unwrap_or_default();
    let closes = result
        .pointer("/indicators/quote/0/close")
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default();

    Ok(timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.as_i64()?, 0)?.date_naive();
            Some(PricePoint {
                date,
                close: close.as_f64()?,
            })
        })
        .collect())
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`
fn raw(module: &Value, field: &str) -> Option<f64> {
    let value = module.get(field)?;
    value.get("raw").and_then(|r| r.as_f64()).or_else(|| value.as_f64())
}

fn text(module: &Value, field: &str) -> Option<String> {
    module
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_quote_summary(ticker: &str, body: &Value) -> Result<Fundamentals, MarketDataError> {
    let result = body
        .pointer("/quoteSummary/result/0")
        .ok_or_else(|| MarketDataError::NoData(ticker.to_string()))?;

    let empty = Value::Null;
    let price = result.get("price").unwrap_or(&empty);
    let profile = result.get("summaryProfile").unwrap_or(&empty);
    let detail = result.get("summaryDetail").unwrap_or(&empty);
    let stats = result.get("defaultKeyStatistics").unwrap_or(&empty);
    let financial = result.get("financialData").unwrap_or(&empty);

    Ok(Fundamentals {
        ticker: ticker.to_string(),
        company_name: text(price, "longName").or_else(|| text(price, "shortName")),
        sector: text(profile, "sector"),
        industry: text(profile, "industry"),
        market_cap: raw(price, "marketCap").or_else(|| raw(detail, "marketCap")),
        pe_ratio: raw(detail, "trailingPE"),
        forward_pe: raw(detail, "forwardPE").or_else(|| raw(stats, "forwardPE")),
        peg_ratio: raw(stats, "pegRatio"),
        price_to_book: raw(stats, "priceToBook"),
        dividend_yield: raw(detail, "dividendYield"),
        beta: raw(detail, "beta"),
        week_52_high: raw(detail, "fiftyTwoWeekHigh"),
        week_52_low: raw(detail, "fiftyTwoWeekLow"),
        current_ratio: raw(financial, "currentRatio"),
        // reported as a percentage
        debt_to_equity: raw(financial, "debtToEquity").map(|d| d / 100.0),
        return_on_equity: raw(financial, "returnOnEquity"),
        return_on_assets: raw(financial, "returnOnAssets"),
        revenue_growth: raw(financial, "revenueGrowth"),
        net_income_growth: raw(financial, "earningsGrowth"),
        free_cash_flow: raw(financial, "freeCashflow"),
        analyst_recommendation: text(financial, "recommendationKey"),
        target_price: raw(financial, "targetMeanPrice"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_construction_is_fallible() {
        let result: Result<YahooFinance, MarketDataError> = YahooFinance::new();
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let body = json!({"chart": {"result": [{
            "timestamp": [1704205800, 1704292200, 1704378600],
            "indicators": {"quote": [{"close": [185.6, null, 181.9]}]}
        }]}});
        let points = parse_chart(&body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date.to_string(), "2024-01-02");
        assert_eq!(points[1].close, 181.9);
    }

    #[test]
    fn test_parse_chart_without_result() {
        let body = json!({"chart": {"result": null, "error": {"code": "Not Found"}}});
        assert!(parse_chart(&body).is_err());
    }

    #[test]
    fn test_parse_quote_summary() {
        let body = json!({"quoteSummary": {"result": [{
            "price": {"longName": "Apple Inc.", "marketCap": {"raw": 3.0e12, "fmt": "3T"}},
            "summaryProfile": {"sector": "Technology", "industry": "Consumer Electronics"},
            "summaryDetail": {"trailingPE": {"raw": 29.4}, "fiftyTwoWeekHigh": {"raw": 199.6}},
            "defaultKeyStatistics": {"pegRatio": {}},
            "financialData": {"debtToEquity": {"raw": 150.0}, "recommendationKey": "buy"}
        }]}});
        let f = parse_quote_summary("AAPL", &body).unwrap();
        assert_eq!(f.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(f.sector.as_deref(), Some("Technology"));
        assert_eq!(f.pe_ratio, Some(29.4));
        assert_eq!(f.week_52_high, Some(199.6));
        assert_eq!(f.peg_ratio, None);
        assert_eq!(f.debt_to_equity, Some(1.5));
        assert_eq!(f.analyst_recommendation.as_deref(), Some("buy"));
    }
}
