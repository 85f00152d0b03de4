//! # Model API
//!
//! Reads and switches the backend new pipeline runs are built against.
//! Runs already in progress keep the variant they started with.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use toolbox_core::PipelineError;

use super::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModelRequest {
    /// "OpenAI" or "Llama Meta"
    pub model_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelStatus {
    pub model_name: String,
}

pub fn routes() -> Router<SharedState> {
    Router::new().route("/model_def", post(set_model).get(get_model))
}

/// Switch the backend for subsequent requests
#[utoipa::path(
    post,
    path = "/model_def",
    tag = "model",
    request_body = ModelRequest,
    responses(
        (status = 200, description = "Backend switched", body = ModelResponse),
        (status = 400, description = "Unknown model name; selection unchanged", body = ModelResponse)
    )
)]
pub async fn set_model(
    State(state): State<SharedState>,
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ModelResponse>), ApiError> {
    let Json(req) = payload?;
    match state.selection.set_by_name(&req.model_name) {
        Ok(variant) => Ok((
            StatusCode::OK,
            Json(ModelResponse {
                status: "success".to_string(),
                message: format!("Successfully loaded model: {}", variant),
            }),
        )),
        Err(e) => {
            tracing::warn!(model_name = %req.model_name, error = %e, "Rejected backend selection");
            let message = match e {
                PipelineError::Configuration(msg) => msg,
                other => other.to_string(),
            };
            Ok((
                StatusCode::BAD_REQUEST,
                Json(ModelResponse {
                    status: "error".to_string(),
                    message,
                }),
            ))
        }
    }
}

/// The backend currently selected
#[utoipa::path(
    get,
    path = "/model_def",
    tag = "model",
    responses(
        (status = 200, description = "Current backend", body = ModelStatus)
    )
)]
pub async fn get_model(State(state): State<SharedState>) -> Result<Json<ModelStatus>, ApiError> {
    let variant = state.selection.current()?;
    Ok(Json(ModelStatus {
        model_name: variant.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use toolbox_core::selection::BackendVariant;
    use toolbox_core::testing::ScriptedRuntime;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_switch_backend() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(Arc::new(ScriptedRuntime::new()), dir.path());

        let response = router(state.clone())
            .oneshot(post_json("/model_def", json!({ "model_name": "Llama Meta" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Successfully loaded model: Llama Meta");
        assert_eq!(state.selection.current().unwrap(), BackendVariant::Alternate);

        let current = router(state).oneshot(get("/model_def")).await.unwrap();
        assert_eq!(body_json(current.into_body()).await["model_name"], "Llama Meta");
    }

    #[tokio::test]
    async fn test_invalid_name_leaves_selection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(Arc::new(ScriptedRuntime::new()), dir.path());

        let response = router(state.clone())
            .oneshot(post_json("/model_def", json!({ "model_name": "Mistral" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["status"], "error");
        assert_eq!(
            body["message"],
            "Invalid model name: Mistral. Must be 'Llama Meta' or 'OpenAI'"
        );
        assert_eq!(state.selection.current().unwrap(), BackendVariant::Primary);
    }
}
