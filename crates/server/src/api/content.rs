//! # Content API
//!
//! One endpoint per content pipeline. Each request binds its single field
//! to the pipeline's input key, runs the pipeline on the backend selected
//! when the request arrived, and wraps the final text.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use toolbox_core::pipeline::{Payload, PipelineKind};

use super::ApiError;
use crate::state::{AppState, SharedState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContentRequest {
    /// Subject of the content, or the context for an image search
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewsRequest {
    pub sector_or_country: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewsResponse {
    pub news: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FundamentalRequest {
    pub ticker: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FundamentalResponse {
    pub analysis: String,
}

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/blog_request", post(blog_request))
        .route("/posts_request", post(posts_request))
        .route("/images_request", post(images_request))
        .route("/latest_news", post(latest_news))
        .route("/fundamental_analysis", post(fundamental_analysis))
}

/// Read the selection once, then run the matching pipeline to completion
async fn run_pipeline(state: &AppState, kind: PipelineKind, value: String) -> Result<String, ApiError> {
    let variant = state.selection.current()?;
    let pipeline = state.catalog.select(kind, variant)?;
    tracing::info!(pipeline = %kind, backend = %variant, "Content request received");

    let input = Payload::new().with(kind.primary_input(), value);
    let output = state.executor.run(&pipeline, &input).await?;
    tracing::info!(pipeline = %kind, chars = output.len(), "Content request completed");
    Ok(output)
}

/// Write a blog article about a subject
#[utoipa::path(
    post,
    path = "/blog_request",
    tag = "content",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "The article", body = MessageResponse),
        (status = 422, description = "Missing subject"),
        (status = 502, description = "A stage failed"),
        (status = 504, description = "A stage timed out")
    )
)]
pub async fn blog_request(
    State(state): State<SharedState>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let message = run_pipeline(&state, PipelineKind::Blog, req.content).await?;
    Ok(Json(MessageResponse { message }))
}

/// Write social media posts about a subject
#[utoipa::path(
    post,
    path = "/posts_request",
    tag = "content",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "The posts", body = MessageResponse),
        (status = 422, description = "Missing subject"),
        (status = 502, description = "A stage failed"),
        (status = 504, description = "A stage timed out")
    )
)]
pub async fn posts_request(
    State(state): State<SharedState>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let message = run_pipeline(&state, PipelineKind::SocialPost, req.content).await?;
    Ok(Json(MessageResponse { message }))
}

/// Find two images matching a context
#[utoipa::path(
    post,
    path = "/images_request",
    tag = "content",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "The image URLs", body = MessageResponse),
        (status = 422, description = "Missing context"),
        (status = 502, description = "The search failed"),
        (status = 504, description = "The search timed out")
    )
)]
pub async fn images_request(
    State(state): State<SharedState>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let message = run_pipeline(&state, PipelineKind::ImageSearch, req.content).await?;
    Ok(Json(MessageResponse { message }))
}

/// Brief the latest financial news for a sector or country
#[utoipa::path(
    post,
    path = "/latest_news",
    tag = "content",
    request_body = NewsRequest,
    responses(
        (status = 200, description = "The briefing", body = NewsResponse),
        (status = 422, description = "Missing sector or country"),
        (status = 502, description = "A stage failed"),
        (status = 504, description = "A stage timed out")
    )
)]
pub async fn latest_news(
    State(state): State<SharedState>,
    payload: Result<Json<NewsRequest>, JsonRejection>,
) -> Result<Json<NewsResponse>, ApiError> {
    let Json(req) = payload?;
    let news = run_pipeline(&state, PipelineKind::FinancialNews, req.sector_or_country).await?;
    Ok(Json(NewsResponse { news }))
}

/// Analyse a stock's fundamentals
#[utoipa::path(
    post,
    path = "/fundamental_analysis",
    tag = "content",
    request_body = FundamentalRequest,
    responses(
        (status = 200, description = "The analysis report", body = FundamentalResponse),
        (status = 422, description = "Missing ticker"),
        (status = 502, description = "A stage failed"),
        (status = 504, description = "A stage timed out")
    )
)]
pub async fn fundamental_analysis(
    State(state): State<SharedState>,
    payload: Result<Json<FundamentalRequest>, JsonRejection>,
) -> Result<Json<FundamentalResponse>, ApiError> {
    let Json(req) = payload?;
    let analysis = run_pipeline(&state, PipelineKind::FundamentalAnalysis, req.ticker).await?;
    Ok(Json(FundamentalResponse { analysis }))
}
