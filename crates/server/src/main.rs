//! Toolbox Server
//!
//! HTTP front for the content pipelines, paper chat and market charts,
//! plus a small CLI for running a pipeline without the server.

mod api;
mod config;
mod logging;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use toolbox_core::agents::standard_registry;
use toolbox_core::pipeline::{Payload, PipelineCatalog, PipelineKind};
use toolbox_core::selection::BackendVariant;

use crate::config::ServerConfig;
use crate::logging::LogFormat;
use crate::state::AppState;

#[derive(Parser)]
#[command(author, version, about = "LLM Toolbox - content pipelines over LLM agents")]
struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one pipeline and print its result
    Run {
        /// Pipeline id, e.g. blog or fundamental_analysis
        pipeline: String,
        /// Input values as key=value
        #[arg(short, long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        /// Backend to run on, "OpenAI" or "Llama Meta"
        #[arg(long)]
        backend: Option<String>,
    },
    /// List the available pipelines
    Pipelines,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!(%addr, "Toolbox server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

async fn run_once(
    config: ServerConfig,
    pipeline: &str,
    inputs: Vec<(String, String)>,
    backend: Option<String>,
) -> anyhow::Result<()> {
    let kind: PipelineKind = pipeline.parse()?;
    let state = AppState::from_config(&config)?;
    if let Some(name) = backend {
        state.selection.set_by_name(&name)?;
    }

    let pipeline = state.catalog.select(kind, state.selection.current()?)?;
    let input: Payload = inputs.into_iter().collect();
    let output = state.executor.run(&pipeline, &input).await?;
    println!("{}", output);
    Ok(())
}

fn list_pipelines(config: &ServerConfig) -> anyhow::Result<()> {
    let workers = standard_registry(&config.backend_models())?;
    let catalog = PipelineCatalog::standard(&workers)?;

    for kind in PipelineKind::ALL {
        let pipeline = catalog.select(kind, BackendVariant::Primary)?;
        let stages: Vec<&str> = pipeline.stages().iter().map(|s| s.name()).collect();
        println!(
            "{:<22} input: {:<8} stages: {}",
            kind.id(),
            kind.primary_input(),
            stages.join(" -> ")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::init(args.log_format, "info")?;

    let mut config = ServerConfig::load()?;

    match args.command {
        None => serve(config).await,
        Some(CliCommand::Serve { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Some(CliCommand::Run {
            pipeline,
            inputs,
            backend,
        }) => run_once(config, &pipeline, inputs, backend).await,
        Some(CliCommand::Pipelines) => list_pipelines(&config),
    }
}
