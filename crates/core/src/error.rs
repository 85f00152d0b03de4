//! # Pipeline Errors
//!
//! Error taxonomy for building and running pipelines.
//!
//! Collaborator errors (search, market data, paper index) live beside their
//! collaborators and reach this taxonomy through the agent runtime as
//! [`StageFailure::Invocation`].

use std::time::Duration;
use thiserror::Error;

/// Why a stage invocation did not produce output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// The invocation exceeded the per-stage timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The agent runtime returned an error
    #[error("{0}")]
    Invocation(String),
}

impl StageFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StageFailure::Timeout(_))
    }
}

/// Errors raised while assembling or executing a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Static definitions are missing or inconsistent (worker, stage, selection value)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input payload lacks values required by stage templates
    #[error("missing required input: {}", keys.join(", "))]
    MissingInput {
        /// Missing keys, sorted and deduplicated
        keys: Vec<String>,
    },

    /// A placeholder could not be resolved while rendering a stage description
    #[error("unresolved placeholder '{{{placeholder}}}' in stage '{stage}'")]
    TemplateResolution { stage: String, placeholder: String },

    /// A stage's delegated invocation failed or timed out
    #[error("stage '{stage}' failed: {cause}")]
    StageExecution { stage: String, cause: StageFailure },
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration(message.into())
    }

    /// Name of the stage the error is attributed to, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::TemplateResolution { stage, .. }
            | PipelineError::StageExecution { stage, .. } => Some(stage),
            PipelineError::Configuration(_) | PipelineError::MissingInput { .. } => None,
        }
    }

    /// True for errors caused by the caller's payload rather than the service
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInput { .. } | PipelineError::TemplateResolution { .. }
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
