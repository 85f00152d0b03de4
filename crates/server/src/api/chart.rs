//! # Chart API
//!
//! Technical-analysis chart for a ticker, returned as SVG.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use toolbox_core::market::{ChartError, HistoryRange, TaChart};

use super::ApiError;
use crate::state::{AppState, SharedState};

fn default_period() -> String {
    "1year".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChartRequest {
    pub ticker: String,
    /// History window, e.g. "1year" or "6mo"
    #[serde(default = "default_period")]
    pub period: String,
}

/// Returned in place of the chart when it cannot be drawn
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<SharedState> {
    Router::new().route("/api/generate-chart", post(generate_chart))
}

async fn render(state: &AppState, ticker: &str, range: HistoryRange) -> Result<String, ChartError> {
    let points = state.market.daily_closes(ticker, range).await?;
    let chart = TaChart::build(ticker, points)?;
    Ok(chart.to_svg())
}

/// Price with 50/200-day moving averages and MACD
#[utoipa::path(
    post,
    path = "/api/generate-chart",
    tag = "chart",
    request_body = ChartRequest,
    responses(
        (status = 200, description = "The chart", content_type = "image/svg+xml", body = String),
        (status = 422, description = "Empty ticker or unsupported period"),
        (status = 502, description = "Chart could not be generated", body = ChartResponse)
    )
)]
pub async fn generate_chart(
    State(state): State<SharedState>,
    payload: Result<Json<ChartRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let ticker = req.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ApiError::Unprocessable(ChartError::EmptyTicker.to_string()));
    }
    let range = req
        .period
        .parse::<HistoryRange>()
        .map_err(|e| ApiError::Unprocessable(e.to_string()))?;

    match render(&state, &ticker, range).await {
        Ok(svg) => {
            tracing::info!(ticker = %ticker, period = %range, "Chart generated");
            Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
        }
        Err(e) => {
            tracing::error!(ticker = %ticker, error = %format!("{:#}", e), "Chart generation failed");
            let body = ChartResponse {
                success: false,
                message: "Error generating chart".to_string(),
                error: Some(e.to_string()),
            };
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use toolbox_core::testing::ScriptedRuntime;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_chart_is_svg_for_normalized_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(Arc::new(ScriptedRuntime::new()), dir.path()));

        let response = app
            .oneshot(post_json(
                "/api/generate-chart",
                json!({ "ticker": "  aapl ", "period": "1year" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/svg+xml");

        let svg = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("AAPL Technical Analysis Chart"));
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(Arc::new(ScriptedRuntime::new()), dir.path()));

        let response = app
            .oneshot(post_json("/api/generate-chart", json!({ "ticker": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response.into_body()).await["detail"],
            "ticker must not be empty"
        );
    }

    #[tokio::test]
    async fn test_market_failure_returns_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state_with(
            Arc::new(ScriptedRuntime::new()),
            FixedMarket { points: Vec::new() },
            dir.path(),
        );

        let response = router(state)
            .oneshot(post_json("/api/generate-chart", json!({ "ticker": "ZZZZ" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error generating chart");
        assert_eq!(body["error"], "no market data for 'ZZZZ'");
    }
}
