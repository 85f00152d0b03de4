//! # LLM Agent Runtime
//!
//! Runs each stage as a radkit `LlmWorker`. The worker's persona becomes
//! the system instructions and its tools are bound to the live
//! [`ToolSet`]; radkit drives the tool-calling loop. A tool that returns
//! directly ends the stage with its own result.

use async_trait::async_trait;
use radkit::agent::LlmWorker;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::agents::Worker;
use crate::models::ModelConfig;
use crate::tools::{DirectAnswer, ToolSet};

use super::{AgentRuntime, ResolvedTask};

/// Structured answer a worker hands back for its stage
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct StageAnswer {
    /// The complete final answer, in the form the task asks for
    pub answer: String,
}

pub struct LlmAgentRuntime {
    tools: ToolSet,
    default_model: ModelConfig,
}

impl LlmAgentRuntime {
    pub fn new(default_model: ModelConfig, tools: ToolSet) -> Self {
        Self {
            tools,
            default_model,
        }
    }

    /// Model a worker runs on
    fn model_for<'a>(&'a self, worker: &'a Worker) -> &'a ModelConfig {
        worker.backend().unwrap_or(&self.default_model)
    }
}

/// Prefer a direct tool result over whatever the model said afterwards
fn settle(direct: &DirectAnswer, outcome: anyhow::Result<StageAnswer>) -> anyhow::Result<String> {
    if let Some(value) = direct.take() {
        tracing::debug!("Tool result returned as the final answer");
        return Ok(value.to_string());
    }
    Ok(outcome?.answer)
}

#[async_trait]
impl AgentRuntime for LlmAgentRuntime {
    async fn invoke(&self, worker: &Worker, task: &ResolvedTask) -> anyhow::Result<String> {
        let model = self.model_for(worker);
        let llm = model.create_llm()?;
        let system_prompt = worker.system_prompt();
        let direct = DirectAnswer::default();

        let mut builder = LlmWorker::<StageAnswer>::builder(llm).with_system_instructions(&system_prompt);
        for tool in worker.tools() {
            builder = builder.with_tool(self.tools.function_tool(*tool, &direct));
        }
        let worker_llm = builder.build();

        tracing::debug!(
            worker = %worker.id(),
            stage = %task.stage,
            model = %model.model,
            tools = worker.tools().len(),
            "Running worker"
        );
        let outcome = worker_llm.run(task.prompt()).await.map_err(anyhow::Error::from);
        settle(&direct, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LlmProvider;
    use serde_json::json;

    #[test]
    fn test_direct_result_wins_over_model_answer() {
        let direct = DirectAnswer::default();
        direct.record(json!({"image_url1": "a", "image_url2": "b"}));
        let answer = settle(
            &direct,
            Ok(StageAnswer {
                answer: "Here are your images".into(),
            }),
        )
        .unwrap();
        assert!(answer.contains("\"image_url1\":\"a\""));
    }

    #[test]
    fn test_direct_result_survives_a_failed_run() {
        let direct = DirectAnswer::default();
        direct.record(json!({"image_url1": "a", "image_url2": "b"}));
        let answer = settle(&direct, Err(anyhow::anyhow!("model went away"))).unwrap();
        assert!(answer.contains("image_url2"));
    }

    #[test]
    fn test_model_answer_and_errors_pass_through() {
        let direct = DirectAnswer::default();
        let answer = settle(&direct, Ok(StageAnswer { answer: "done".into() })).unwrap();
        assert_eq!(answer, "done");
        let err = settle(&direct, Err(anyhow::anyhow!("quota exceeded"))).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_worker_backend_overrides_default_model() {
        let market = std::sync::Arc::new(crate::market::YahooFinance::new().unwrap());
        let tools = ToolSet::from_env(market).unwrap();
        let runtime = LlmAgentRuntime::new(ModelConfig::default(), tools);

        let plain = Worker::new("w", "r", "g", "b");
        assert_eq!(runtime.model_for(&plain).model, "gpt-4o-mini");

        let groq = Worker::new("w", "r", "g", "b")
            .with_backend(ModelConfig::with_provider(LlmProvider::Groq, "llama-3.1-8b-instant"));
        assert_eq!(runtime.model_for(&groq).provider, LlmProvider::Groq);
    }
}
