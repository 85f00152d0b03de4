//! # HTTP API
//!
//! Routes keep the paths and field names existing clients already use.
//!
//! ## Modules
//!
//! - `content` - One endpoint per content pipeline
//! - `model` - Backend selection
//! - `papers` - arXiv search, indexing and chat
//! - `chart` - Technical-analysis chart
//! - `error` - Error to response mapping

pub mod chart;
pub mod content;
pub mod error;
pub mod model;
pub mod papers;

use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::state::SharedState;

pub use error::ApiError;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LLM Toolbox API",
        version = "1.0.0",
        description = "Content pipelines, research-paper chat and market charts"
    ),
    paths(
        content::blog_request,
        content::posts_request,
        content::images_request,
        content::latest_news,
        content::fundamental_analysis,
        model::set_model,
        model::get_model,
        papers::search,
        papers::process_papers,
        papers::chat,
        papers::existing_index,
        chart::generate_chart
    ),
    components(
        schemas(
            content::ContentRequest,
            content::MessageResponse,
            content::NewsRequest,
            content::NewsResponse,
            content::FundamentalRequest,
            content::FundamentalResponse,
            model::ModelRequest,
            model::ModelResponse,
            model::ModelStatus,
            papers::ArxivSearchRequest,
            papers::PaperEntry,
            papers::PaperSearchResponse,
            papers::PaperProcessRequest,
            papers::ProcessResponse,
            papers::ChatRequest,
            papers::ChatResponse,
            papers::IndexStatus,
            chart::ChartRequest,
            chart::ChartResponse
        )
    ),
    tags(
        (name = "content", description = "Content generation pipelines"),
        (name = "model", description = "Backend selection"),
        (name = "papers", description = "Research-paper question answering"),
        (name = "chart", description = "Technical-analysis charts")
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(content::routes())
        .merge(model::routes())
        .merge(papers::routes())
        .merge(chart::routes())
        .route("/api/openapi.json", get(serve_openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;

    use toolbox_core::agents::definitions::PAPER_ASSISTANT;
    use toolbox_core::agents::standard_registry;
    use toolbox_core::market::{Fundamentals, HistoryRange, MarketData, MarketDataError, PricePoint};
    use toolbox_core::models::BackendModels;
    use toolbox_core::papers::PaperLibrary;
    use toolbox_core::pipeline::{PipelineCatalog, PipelineExecutor};
    use toolbox_core::runtime::AgentRuntime;
    use toolbox_core::selection::{BackendSelection, BackendVariant};
    use toolbox_core::testing::ScriptedRuntime;

    use crate::state::{AppState, SharedState};

    /// Market data with a fixed daily series; empty means no data
    pub struct FixedMarket {
        pub points: Vec<PricePoint>,
    }

    impl FixedMarket {
        pub fn daily(n: usize) -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Self {
                points: (0..n)
                    .map(|i| PricePoint {
                        date: start + chrono::Duration::days(i as i64),
                        close: 150.0 + (i as f64 / 5.0).sin() * 4.0,
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl MarketData for FixedMarket {
        async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
            Ok(Fundamentals {
                ticker: ticker.to_string(),
                ..Fundamentals::default()
            })
        }

        async fn daily_closes(
            &self,
            ticker: &str,
            _range: HistoryRange,
        ) -> Result<Vec<PricePoint>, MarketDataError> {
            if self.points.is_empty() {
                return Err(MarketDataError::NoData(ticker.to_string()));
            }
            Ok(self.points.clone())
        }
    }

    pub fn test_state_with(
        runtime: Arc<ScriptedRuntime>,
        market: FixedMarket,
        data_dir: &Path,
    ) -> SharedState {
        let workers = standard_registry(&BackendModels::default()).unwrap();
        let catalog = PipelineCatalog::standard(&workers).unwrap();
        let runtime: Arc<dyn AgentRuntime> = runtime;
        let executor =
            PipelineExecutor::new(runtime.clone()).with_stage_timeout(Duration::from_millis(200));
        let papers =
            PaperLibrary::new(data_dir, runtime, workers.get(PAPER_ASSISTANT).unwrap()).unwrap();

        Arc::new(AppState {
            selection: Arc::new(BackendSelection::new(BackendVariant::Primary)),
            catalog: Arc::new(catalog),
            executor: Arc::new(executor),
            papers: Arc::new(papers),
            market: Arc::new(market),
        })
    }

    pub fn test_state(runtime: Arc<ScriptedRuntime>, data_dir: &Path) -> SharedState {
        test_state_with(runtime, FixedMarket::daily(260), data_dir)
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn body_bytes(body: Body) -> Vec<u8> {
        body.collect().await.unwrap().to_bytes().to_vec()
    }

    pub async fn body_json(body: Body) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(body).await).unwrap()
    }
}
