//! # API Errors
//!
//! Every failure leaves a handler as an [`ApiError`] and reaches the caller
//! as `{"detail": "<message>"}`. The full error is logged here; the body
//! only carries the top-level message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use toolbox_core::papers::PaperError;
use toolbox_core::{PipelineError, StageFailure};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    BadGateway(String),
    GatewayTimeout(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "detail": self.message() });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Malformed request body");
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        tracing::error!(error = %format!("{:#}", err), stage = ?err.stage(), "Pipeline request failed");
        let message = err.to_string();
        match &err {
            PipelineError::MissingInput { .. } | PipelineError::TemplateResolution { .. } => {
                ApiError::Unprocessable(message)
            }
            PipelineError::StageExecution {
                cause: StageFailure::Timeout(_),
                ..
            } => ApiError::GatewayTimeout(message),
            PipelineError::StageExecution { .. } => ApiError::BadGateway(message),
            PipelineError::Configuration(_) => ApiError::Internal(message),
        }
    }
}

impl From<PaperError> for ApiError {
    fn from(err: PaperError) -> Self {
        tracing::error!(error = %format!("{:#}", err), "Paper request failed");
        let message = err.to_string();
        match err {
            PaperError::NoDocuments => ApiError::BadRequest(message),
            PaperError::NoIndex => ApiError::NotFound(message),
            PaperError::Http(_)
            | PaperError::Embedding(_)
            | PaperError::Extraction { .. }
            | PaperError::Chat(_) => ApiError::BadGateway(message),
            PaperError::Io(_) | PaperError::Storage(_) | PaperError::Task(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pipeline_error_statuses() {
        let missing = ApiError::from(PipelineError::MissingInput {
            keys: vec!["ticker".to_string()],
        });
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(missing.message(), "missing required input: ticker");

        let timeout = ApiError::from(PipelineError::StageExecution {
            stage: "create_content".to_string(),
            cause: StageFailure::Timeout(Duration::from_secs(300)),
        });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let failed = ApiError::from(PipelineError::StageExecution {
            stage: "find_data".to_string(),
            cause: StageFailure::Invocation("rate limited".to_string()),
        });
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
        assert!(failed.message().contains("find_data"));

        let config = ApiError::from(PipelineError::configuration("no pipeline"));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_paper_error_statuses() {
        assert_eq!(ApiError::from(PaperError::NoDocuments).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(PaperError::NoIndex).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(PaperError::Chat("boom".to_string())).message(),
            "Error chatting with papers: boom"
        );
    }
}
