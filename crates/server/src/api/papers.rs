//! # Papers API
//!
//! arXiv search and download, index building, and chat over the index.
//! This path does not go through the pipeline executor.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ApiError;
use crate::state::SharedState;

fn default_max_results() -> usize {
    10
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ArxivSearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaperEntry {
    pub title: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaperSearchResponse {
    pub papers: Vec<PaperEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaperProcessRequest {
    pub filenames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexStatus {
    pub index_exists: bool,
}

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/arxiv/search", post(search))
        .route("/arxiv/process_papers", post(process_papers))
        .route("/arxiv/chat", post(chat))
        .route("/arxiv/existing_index", get(existing_index))
}

/// Search arXiv and download the matching PDFs
#[utoipa::path(
    post,
    path = "/arxiv/search",
    tag = "papers",
    request_body = ArxivSearchRequest,
    responses(
        (status = 200, description = "Downloaded papers", body = PaperSearchResponse),
        (status = 400, description = "Empty query"),
        (status = 502, description = "arXiv unavailable")
    )
)]
pub async fn search(
    State(state): State<SharedState>,
    payload: Result<Json<ArxivSearchRequest>, JsonRejection>,
) -> Result<Json<PaperSearchResponse>, ApiError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let papers = state
        .papers
        .search_and_download(req.query.trim(), req.max_results)
        .await?;
    tracing::info!(query = %req.query, downloaded = papers.len(), "arXiv search completed");

    Ok(Json(PaperSearchResponse {
        papers: papers
            .into_iter()
            .map(|p| PaperEntry {
                title: p.title,
                filename: p.filename,
            })
            .collect(),
    }))
}

/// Build the index from downloaded papers, replacing any previous index
#[utoipa::path(
    post,
    path = "/arxiv/process_papers",
    tag = "papers",
    request_body = PaperProcessRequest,
    responses(
        (status = 200, description = "Index created", body = ProcessResponse),
        (status = 400, description = "No document could be processed"),
        (status = 502, description = "Embedding failed")
    )
)]
pub async fn process_papers(
    State(state): State<SharedState>,
    payload: Result<Json<PaperProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(req) = payload?;
    let summary = state.papers.process(&req.filenames).await?;
    tracing::info!(
        documents = summary.documents,
        chunks = summary.chunks,
        "Paper index created"
    );
    Ok(Json(ProcessResponse {
        status: "success".to_string(),
        message: "Index created successfully".to_string(),
    }))
}

/// Answer a question from the indexed papers
#[utoipa::path(
    post,
    path = "/arxiv/chat",
    tag = "papers",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer", body = ChatResponse),
        (status = 404, description = "No index has been built"),
        (status = 502, description = "The model call failed")
    )
)]
pub async fn chat(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let response = state.papers.chat(&req.query).await?;
    Ok(Json(ChatResponse { response }))
}

/// Whether a persisted index is available
#[utoipa::path(
    get,
    path = "/arxiv/existing_index",
    tag = "papers",
    responses(
        (status = 200, description = "Index availability", body = IndexStatus)
    )
)]
pub async fn existing_index(State(state): State<SharedState>) -> Json<IndexStatus> {
    Json(IndexStatus {
        index_exists: state.papers.index_exists().await,
    })
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
    async fn test_no_index_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(ScriptedRuntime::new());
        let state = test_state(runtime.clone(), dir.path());

        let status = router(state.clone())
            .oneshot(get("/arxiv/existing_index"))
            .await
            .unwrap();
        assert_eq!(status.status(), StatusCode::OK);
        assert_eq!(body_json(status.into_body()).await["index_exists"], false);

        let chat = router(state)
            .oneshot(post_json("/arxiv/chat", json!({ "query": "What is attention?" })))
            .await
            .unwrap();
        assert_eq!(chat.status(), StatusCode::NOT_FOUND);
        assert!(body_json(chat.into_body()).await["detail"].is_string());
        assert_eq!(runtime.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_without_usable_papers() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(Arc::new(ScriptedRuntime::new()), dir.path()));

        let response = app
            .oneshot(post_json(
                "/arxiv/process_papers",
                json!({ "filenames": ["2401.00001v1.pdf"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response.into_body()).await["detail"],
            "No documents were successfully processed!"
        );
    }

    #[tokio::test]
    async fn test_blank_search_query_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(Arc::new(ScriptedRuntime::new()), dir.path()));

        let response = app
            .oneshot(post_json("/arxiv/search", json!({ "query": "  " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
