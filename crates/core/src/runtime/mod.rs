//! # Agent Runtime
//!
//! The executor hands each stage to an [`AgentRuntime`] as one opaque
//! call. What happens inside (model requests, tool calls, retries) is the
//! runtime's business.
//!
//! ## Modules
//!
//! - `llm` - radkit `LlmWorker` runtime with the worker's tools bound

pub mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::Worker;

pub use llm::{LlmAgentRuntime, StageAnswer};

/// A stage description after placeholder substitution and context injection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTask {
    pub stage: String,
    pub description: String,
    pub expected_output: String,
}

impl ResolvedTask {
    /// The user message sent to the model
    pub fn prompt(&self) -> String {
        if self.expected_output.trim().is_empty() {
            return self.description.clone();
        }
        format!(
            "{}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        )
    }
}

/// Runs one worker on one resolved task
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn invoke(&self, worker: &Worker, task: &ResolvedTask) -> anyhow::Result<String>;
}
