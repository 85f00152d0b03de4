//! # Tools
//!
//! Actions a worker may take while the agent runtime works on a stage.
//! Workers only name their tools ([`Tool`]); the runtime asks the live
//! [`ToolSet`] for a radkit `FunctionTool` per name, with the service
//! captured in the closure. The executor never calls these directly.
//!
//! ## Modules
//!
//! - `web_search` - Serper.dev web search
//! - `scrape` - Fetch a page and reduce it to readable text
//! - `lexica` - Image search on lexica.art
//! - `fundamentals` - Company fundamentals via the market-data collaborator

pub mod fundamentals;
pub mod lexica;
pub mod scrape;
pub mod web_search;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use radkit::tools::{FunctionTool, ToolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::market::MarketData;

pub use fundamentals::{FundamentalsArgs, FundamentalsTool};
pub use lexica::{LexicaImageSearch, LexicaSearchArgs, LexicaSearchOutput};
pub use scrape::{html_to_text, ScrapeArgs, ScrapeWebsite};
pub use web_search::{SearchWebArgs, SerperSearch};

/// Errors a tool reports back to the model
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Failed(String),
}

/// The tools a worker can be given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    WebSearch,
    ScrapeWebsite,
    ImageSearch,
    Fundamentals,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Tool::WebSearch,
        Tool::ScrapeWebsite,
        Tool::ImageSearch,
        Tool::Fundamentals,
    ];

    /// Identifier exposed to the model
    pub fn name(&self) -> &'static str {
        match self {
            Tool::WebSearch => "web_search",
            Tool::ScrapeWebsite => "scrape_website",
            Tool::ImageSearch => "lexica_image_search",
            Tool::Fundamentals => "fundamental_analysis",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::WebSearch => {
                "Search the web for information. Returns search results with URLs and snippets. \
                 Args: {\"query\": \"...\", \"max_results\": 5}"
            }
            Tool::ScrapeWebsite => {
                "Read a website's content. Returns the page text with markup removed. \
                 Args: {\"website_url\": \"https://...\"}"
            }
            Tool::ImageSearch => {
                "Searches for images on Lexica.art and returns the URLs of the first two images found. \
                 Args: {\"query\": \"...\"}"
            }
            Tool::Fundamentals => {
                "Perform comprehensive fundamental analysis on a given stock ticker. Returns \
                 valuation metrics, financial ratios, growth rates and analyst targets. \
                 Args: {\"ticker\": \"AAPL\"}"
            }
        }
    }

    /// When true, a successful result is the worker's final answer
    pub fn returns_direct(&self) -> bool {
        matches!(self, Tool::ImageSearch)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holds the first result of a `returns_direct` tool for the runtime
#[derive(Debug, Clone, Default)]
pub struct DirectAnswer(Arc<Mutex<Option<serde_json::Value>>>);

impl DirectAnswer {
    fn slot(&self) -> MutexGuard<'_, Option<serde_json::Value>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, value: serde_json::Value) {
        let mut slot = self.slot();
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    pub fn take(&self) -> Option<serde_json::Value> {
        self.slot().take()
    }
}

/// Deserialize the arguments object the model sent
pub fn decode_args<T: DeserializeOwned>(tool: Tool, args: &impl Serialize) -> Result<T, ToolError> {
    serde_json::to_value(args)
        .and_then(serde_json::from_value::<T>)
        .map_err(|e| ToolError::InvalidArguments {
            tool: tool.name().to_string(),
            reason: e.to_string(),
        })
}

/// Map a tool outcome onto radkit's result, capturing direct answers
fn finish(tool: Tool, result: Result<serde_json::Value, ToolError>, direct: &DirectAnswer) -> ToolResult {
    match result {
        Ok(value) => {
            if tool.returns_direct() {
                direct.record(value.clone());
            }
            ToolResult::success(value)
        }
        Err(e) => {
            tracing::warn!(tool = %tool, error = %e, "Tool failed");
            ToolResult::error(e.to_string())
        }
    }
}

/// Wrap `call` on `service` as a radkit tool
fn bind<S, A, F, Fut>(tool: Tool, service: Arc<S>, direct: DirectAnswer, call: F) -> FunctionTool
where
    S: Send + Sync + 'static,
    A: DeserializeOwned + Send + 'static,
    F: Fn(Arc<S>, A) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, ToolError>> + Send + 'static,
{
    FunctionTool::new(tool.name(), tool.description(), move |args, _ctx| {
        let service = service.clone();
        let direct = direct.clone();
        let call = call.clone();
        let decoded = decode_args::<A>(tool, &args);
        Box::pin(async move {
            tracing::debug!(tool = %tool, "Invoking tool");
            let result = match decoded {
                Ok(args) => call(service, args).await,
                Err(e) => Err(e),
            };
            finish(tool, result, &direct)
        })
    })
}

/// Shared HTTP client for the network tools
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("llm-toolbox/1.0")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build the HTTP client for tools")
}

/// The live services behind every [`Tool`]
#[derive(Clone)]
pub struct ToolSet {
    pub web_search: Arc<SerperSearch>,
    pub scrape_website: Arc<ScrapeWebsite>,
    pub image_search: Arc<LexicaImageSearch>,
    pub fundamentals: Arc<FundamentalsTool>,
}

impl ToolSet {
    /// Production tools; credentials are read from the environment
    pub fn from_env(market: Arc<dyn MarketData>) -> anyhow::Result<Self> {
        let client = http_client()?;
        Ok(Self {
            web_search: Arc::new(SerperSearch::from_env(client.clone())),
            scrape_website: Arc::new(ScrapeWebsite::new(client.clone())),
            image_search: Arc::new(LexicaImageSearch::new(client)),
            fundamentals: Arc::new(FundamentalsTool::new(market)),
        })
    }

    /// A radkit tool for `tool`; direct answers land in `direct`
    pub fn function_tool(&self, tool: Tool, direct: &DirectAnswer) -> FunctionTool {
        let direct = direct.clone();
        match tool {
            Tool::WebSearch => bind(tool, self.web_search.clone(), direct, |search, args: SearchWebArgs| async move {
                search.search(args).await
            }),
            Tool::ScrapeWebsite => bind(tool, self.scrape_website.clone(), direct, |scraper, args: ScrapeArgs| async move {
                scraper.scrape(args).await
            }),
            Tool::ImageSearch => bind(tool, self.image_search.clone(), direct, |lexica, args: LexicaSearchArgs| async move {
                lexica.search(args).await
            }),
            Tool::Fundamentals => bind(tool, self.fundamentals.clone(), direct, |analyst, args: FundamentalsArgs| async move {
                analyst.analyze(args).await
            }),
        }
    }
}
