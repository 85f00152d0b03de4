//! # Pipeline Executor
//!
//! Runs a pipeline's stages strictly in order for one input payload.
//!
//! ## Run
//!
//! 1. Validate the payload against every stage template (no stage runs otherwise)
//! 2. For each stage: resolve, invoke the worker under the stage timeout, record output
//! 3. The first failure aborts the run and names the failing stage
//! 4. Only the last stage's output is returned
//!
//! Stage outputs live in a map local to the run, so concurrent runs of the
//! same pipeline never see each other's intermediate results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::error::{PipelineError, PipelineResult, StageFailure};
use crate::runtime::AgentRuntime;

use super::events::{next_run_id, PipelineEvent, PipelineEventKind};
use super::{Payload, Pipeline};

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

pub struct PipelineExecutor {
    runtime: Arc<dyn AgentRuntime>,
    stage_timeout: Duration,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl PipelineExecutor {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            runtime,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            event_tx: None,
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Send progress events to a channel
    pub fn with_event_channel(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn stage_timeout(&self) -> Duration {
        self.stage_timeout
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    async fn fail(&self, run_id: &str, pipeline: &Pipeline, error: PipelineError) -> PipelineError {
        let mut event = PipelineEvent::new(PipelineEventKind::PipelineFailed, run_id, pipeline.name())
            .with_data(serde_json::json!({ "error": error.to_string() }));
        if let Some(stage) = error.stage() {
            event = event.with_stage(stage);
        }
        self.emit(event).await;
        error
    }

    /// Execute `pipeline` against `input` and return the final stage's output
    #[tracing::instrument(skip(self, pipeline, input), fields(pipeline = %pipeline.name(), run_id = tracing::field::Empty))]
    pub async fn run(&self, pipeline: &Pipeline, input: &Payload) -> PipelineResult<String> {
        if let Err(e) = pipeline.validate_input(input) {
            tracing::warn!(error = %e, "Rejected pipeline input");
            return Err(e);
        }

        let run_id = next_run_id();
        tracing::Span::current().record("run_id", &run_id.as_str());
        tracing::info!(stages = pipeline.stages().len(), "Pipeline started");
        self.emit(
            PipelineEvent::new(PipelineEventKind::PipelineStarted, &run_id, pipeline.name())
                .with_data(serde_json::json!({ "stages": pipeline.stages().len() })),
        )
        .await;

        let run_started = Instant::now();
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut final_output = String::new();

        for stage in pipeline.stages() {
            let task = match stage.resolve(input, &outputs) {
                Ok(task) => task,
                Err(e) => return Err(self.fail(&run_id, pipeline, e).await),
            };

            tracing::info!(stage = %stage.name(), worker = %stage.worker().id(), "Stage started");
            self.emit(
                PipelineEvent::new(PipelineEventKind::StageStarted, &run_id, pipeline.name())
                    .with_stage(stage.name())
                    .with_data(serde_json::json!({ "worker": stage.worker().id() })),
            )
            .await;

            let started = Instant::now();
            let invocation = self.runtime.invoke(stage.worker(), &task);
            let cause = match tokio::time::timeout(self.stage_timeout, invocation).await {
                Ok(Ok(output)) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::info!(stage = %stage.name(), elapsed_ms, "Stage completed");
                    self.emit(
                        PipelineEvent::new(PipelineEventKind::StageCompleted, &run_id, pipeline.name())
                            .with_stage(stage.name())
                            .with_data(serde_json::json!({
                                "elapsed_ms": elapsed_ms,
                                "output_chars": output.chars().count()
                            })),
                    )
                    .await;
                    outputs.insert(stage.name().to_string(), output.clone());
                    final_output = output;
                    continue;
                }
                Ok(Err(e)) => StageFailure::Invocation(format!("{:#}", e)),
                Err(_) => StageFailure::Timeout(self.stage_timeout),
            };

            tracing::warn!(stage = %stage.name(), cause = %cause, "Stage failed");
            self.emit(
                PipelineEvent::new(PipelineEventKind::StageFailed, &run_id, pipeline.name())
                    .with_stage(stage.name())
                    .with_data(serde_json::json!({
                        "error": cause.to_string(),
                        "timeout": cause.is_timeout()
                    })),
            )
            .await;
            let error = PipelineError::StageExecution {
                stage: stage.name().to_string(),
                cause,
            };
            return Err(self.fail(&run_id, pipeline, error).await);
        }

        let elapsed_ms = run_started.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, "Pipeline completed");
        self.emit(
            PipelineEvent::new(PipelineEventKind::PipelineCompleted, &run_id, pipeline.name())
                .with_data(serde_json::json!({ "elapsed_ms": elapsed_ms })),
        )
        .await;
        Ok(final_output)
    }
}
