//! # Toolbox Models
//!
//! Centralized LLM configuration types for the Toolbox system.
//! Both supported providers speak the OpenAI chat-completions protocol,
//! so a provider is just a base URL plus the environment variable that
//! holds its API key. Clients are radkit's `OpenAILlm`.

use anyhow::Context;
use radkit::models::providers::OpenAILlm;
use serde::{Deserialize, Serialize};

/// Supported LLM providers
///
/// - OpenAI (GPT) - `OPENAI_API_KEY`
/// - Groq (hosted Llama) - `GROQ_API_KEY`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Groq,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![LlmProvider::OpenAI, LlmProvider::Groq]
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Groq => "Groq",
        }
    }

    /// Environment variable holding the API key
    pub fn env_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
        }
    }

    /// OpenAI-compatible API root
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }
}

/// Configuration for LLM model selection
///
/// Workers may carry their own `ModelConfig`; workers without one run on
/// the runtime's default (the primary backend).
///
/// ## Example
/// ```rust,ignore
/// use toolbox_core::models::{ModelConfig, LlmProvider};
///
/// let config = ModelConfig::with_provider(LlmProvider::Groq, "llama-3.1-8b-instant");
/// let llm = config.create_llm()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "gpt-4o-mini", "llama-3.1-8b-instant")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new("gpt-4o-mini")
    }
}

impl ModelConfig {
    /// Create a new model config with default provider (OpenAI)
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::OpenAI, model)
    }

    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Llama hosted on Groq
    pub fn groq_llama(model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::Groq, model)
    }

    /// Set base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// API root used for requests, without trailing slash
    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Read the provider's API key from the environment
    pub fn api_key(&self) -> anyhow::Result<String> {
        let var = self.provider.env_var();
        std::env::var(var).with_context(|| format!("{} is not set", var))
    }

    /// Create an LLM client for the configured provider
    ///
    /// OpenAI loads its key through `from_env`; Groq is reached on its
    /// OpenAI-compatible endpoint with `GROQ_API_KEY`.
    pub fn create_llm(&self) -> anyhow::Result<OpenAILlm> {
        match self.provider {
            LlmProvider::OpenAI => {
                let llm = OpenAILlm::from_env(&self.model)?;
                Ok(match &self.base_url {
                    Some(_) => llm.with_base_url(&self.endpoint()),
                    None => llm,
                })
            }
            LlmProvider::Groq => {
                let api_key = self.api_key()?;
                Ok(OpenAILlm::new(&self.model, &api_key).with_base_url(&self.endpoint()))
            }
        }
    }
}

/// The pair of model configurations the two backend variants run on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendModels {
    /// Default model for every worker without its own backend
    pub primary: ModelConfig,
    /// Model bound to the alternate-variant workers
    pub alternate: ModelConfig,
}

impl Default for BackendModels {
    fn default() -> Self {
        Self {
            primary: ModelConfig::default(),
            alternate: ModelConfig::groq_llama("llama-3.1-8b-instant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.endpoint(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_provider_display_names() {
        assert_eq!(LlmProvider::OpenAI.display_name(), "OpenAI");
        assert_eq!(LlmProvider::Groq.display_name(), "Groq");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config = ModelConfig::new("gpt-4o").with_base_url("http://localhost:11434/v1/");
        assert_eq!(config.endpoint(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_groq_defaults() {
        let models = BackendModels::default();
        assert_eq!(models.alternate.provider, LlmProvider::Groq);
        assert_eq!(models.alternate.model, "llama-3.1-8b-instant");
        assert_eq!(models.alternate.endpoint(), "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_groq_client_needs_its_own_key() {
        let config = ModelConfig::with_provider(LlmProvider::Groq, "llama-3.1-8b-instant");
        if std::env::var("GROQ_API_KEY").is_err() {
            let err = config.create_llm().err().unwrap();
            assert!(err.to_string().contains("GROQ_API_KEY"));
        }
    }

    #[test]
    fn test_model_config_serialization() {
        let config = ModelConfig::with_provider(LlmProvider::Groq, "llama-3.1-8b-instant");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("groq"));
        assert!(json.contains("llama-3.1-8b-instant"));
    }
}
