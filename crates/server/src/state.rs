//! # Application State
//!
//! Everything the handlers share, built once at startup. The backend
//! selection is the only piece of it that changes after startup.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use toolbox_core::agents::definitions::PAPER_ASSISTANT;
use toolbox_core::agents::standard_registry;
use toolbox_core::market::{MarketData, YahooFinance};
use toolbox_core::papers::PaperLibrary;
use toolbox_core::pipeline::{PipelineCatalog, PipelineEvent, PipelineEventKind, PipelineExecutor};
use toolbox_core::runtime::{AgentRuntime, LlmAgentRuntime};
use toolbox_core::selection::BackendSelection;
use toolbox_core::tools::ToolSet;

use crate::config::ServerConfig;

const EVENT_BUFFER: usize = 256;

pub struct AppState {
    pub selection: Arc<BackendSelection>,
    pub catalog: Arc<PipelineCatalog>,
    pub executor: Arc<PipelineExecutor>,
    pub papers: Arc<PaperLibrary>,
    pub market: Arc<dyn MarketData>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the production collaborators. Must be called inside a tokio runtime.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<SharedState> {
        let variant = config.default_variant()?;
        let models = config.backend_models();

        let market: Arc<dyn MarketData> = Arc::new(YahooFinance::new()?);
        let tools = ToolSet::from_env(market.clone())?;
        let workers = standard_registry(&models)?;
        let catalog = PipelineCatalog::standard(&workers)?;

        let runtime: Arc<dyn AgentRuntime> =
            Arc::new(LlmAgentRuntime::new(models.primary.clone(), tools));

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(log_events(event_rx));
        let executor = PipelineExecutor::new(runtime.clone())
            .with_stage_timeout(config.stage_timeout())
            .with_event_channel(event_tx);

        let papers = PaperLibrary::new(&config.data_dir, runtime, workers.get(PAPER_ASSISTANT)?)
            .context("Failed to set up the paper library")?
            .with_chunking(config.chunk_size, config.chunk_overlap);

        tracing::info!(
            backend = %variant,
            workers = workers.len(),
            pipelines = catalog.len(),
            stage_timeout_secs = config.stage_timeout_secs,
            data_dir = %config.data_dir.display(),
            "Application state ready"
        );

        Ok(Arc::new(AppState {
            selection: Arc::new(BackendSelection::new(variant)),
            catalog: Arc::new(catalog),
            executor: Arc::new(executor),
            papers: Arc::new(papers),
            market,
        }))
    }
}

/// Drain executor events into the log
pub async fn log_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        let stage = event.stage.as_deref().unwrap_or("-");
        match event.kind {
            PipelineEventKind::StageFailed | PipelineEventKind::PipelineFailed => {
                tracing::warn!(
                    run_id = %event.run_id,
                    pipeline = %event.pipeline,
                    stage,
                    kind = ?event.kind,
                    data = ?event.data,
                    "Pipeline event"
                );
            }
            _ => {
                tracing::debug!(
                    run_id = %event.run_id,
                    pipeline = %event.pipeline,
                    stage,
                    kind = ?event.kind,
                    data = ?event.data,
                    "Pipeline event"
                );
            }
        }
    }
}
