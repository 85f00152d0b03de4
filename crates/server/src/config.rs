//! # Server Configuration
//!
//! Read from `.toolbox/config.json` when present. Every field has a
//! default, so a partial file only overrides what it names. API keys are
//! never stored here; they come from the environment (or `.env`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use toolbox_core::models::{BackendModels, ModelConfig};
use toolbox_core::papers::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use toolbox_core::pipeline::DEFAULT_STAGE_TIMEOUT;
use toolbox_core::selection::BackendVariant;
use toolbox_core::PipelineResult;

pub const CONFIG_PATH: &str = ".toolbox/config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a single stage invocation
    pub stage_timeout_secs: u64,
    /// Root for downloaded papers and the paper index
    pub data_dir: PathBuf,
    /// Backend selected at startup: "OpenAI" or "Llama Meta"
    pub default_backend: String,
    pub primary_model: String,
    /// Served by Groq
    pub alternate_model: String,
    /// Characters per indexed paper chunk
    pub chunk_size: usize,
    /// Must stay below `chunk_size`
    pub chunk_overlap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT.as_secs(),
            data_dir: PathBuf::from("data"),
            default_backend: BackendVariant::Primary.display_name().to_string(),
            primary_model: "gpt-4o-mini".to_string(),
            alternate_model: "llama-3.1-8b-instant".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ServerConfig {
    /// Load from [`CONFIG_PATH`], or defaults when the file does not exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.stage_timeout_secs == 0 {
            anyhow::bail!("stage_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// The variant the selection register starts with. An unknown name is fatal.
    pub fn default_variant(&self) -> PipelineResult<BackendVariant> {
        BackendVariant::from_name(&self.default_backend)
    }

    pub fn backend_models(&self) -> BackendModels {
        BackendModels {
            primary: ModelConfig::new(&self.primary_model),
            alternate: ModelConfig::groq_llama(&self.alternate_model),
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}
