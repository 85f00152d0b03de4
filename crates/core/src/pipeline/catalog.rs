//! # Pipeline Catalogue
//!
//! Every pipeline the service offers, built once per backend variant.
//! Choosing a pipeline for a request is a pure lookup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::definitions::{
    BLOG_WRITER, FINANCIAL_SEARCH, FINANCIAL_WRITER, IMAGE_SEARCHER, POST_WRITER, STOCK_ANALYST,
    STOCK_RESEARCHER, WEB_SEARCH, WEB_SEARCH_GROQ,
};
use crate::agents::WorkerRegistry;
use crate::error::{PipelineError, PipelineResult};
use crate::selection::BackendVariant;

use super::prompts;
use super::{Pipeline, Stage, StageRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Blog,
    SocialPost,
    FinancialNews,
    FundamentalAnalysis,
    ImageSearch,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::Blog,
        PipelineKind::SocialPost,
        PipelineKind::FinancialNews,
        PipelineKind::FundamentalAnalysis,
        PipelineKind::ImageSearch,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PipelineKind::Blog => "blog",
            PipelineKind::SocialPost => "social_post",
            PipelineKind::FinancialNews => "financial_news",
            PipelineKind::FundamentalAnalysis => "fundamental_analysis",
            PipelineKind::ImageSearch => "image_search",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    /// The payload key the request's single field is bound to
    pub fn primary_input(&self) -> &'static str {
        match self {
            PipelineKind::Blog | PipelineKind::SocialPost | PipelineKind::FinancialNews => {
                "subject"
            }
            PipelineKind::FundamentalAnalysis => "ticker",
            PipelineKind::ImageSearch => "context",
        }
    }

    fn stage_names(&self) -> &'static [&'static str] {
        match self {
            PipelineKind::Blog => &["find_data", "create_content"],
            PipelineKind::SocialPost => &["find_data", "social_create_content"],
            PipelineKind::FinancialNews => &["monitor_financial_news", "create_financial_content"],
            PipelineKind::FundamentalAnalysis => &["stock_research", "stock_analysis"],
            PipelineKind::ImageSearch => &["image_search"],
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PipelineKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| {
            PipelineError::configuration(format!(
                "unknown pipeline '{}'; expected one of: {}",
                s,
                Self::ALL.map(|k| k.id()).join(", ")
            ))
        })
    }
}

/// Stage definitions for one variant. Only the web researcher differs.
pub fn standard_stages(
    workers: &WorkerRegistry,
    variant: BackendVariant,
) -> PipelineResult<StageRegistry> {
    let researcher = match variant {
        BackendVariant::Primary => workers.get(WEB_SEARCH)?,
        BackendVariant::Alternate => workers.get(WEB_SEARCH_GROQ)?,
    };

    StageRegistry::from_stages([
        Stage::new("find_data", prompts::FIND_DATA, researcher).with_expected_output(
            "A list of the key facts and figures found, each with the URL of its source",
        ),
        Stage::new("create_content", prompts::CREATE_CONTENT, workers.get(BLOG_WRITER)?)
            .with_context("find_data")
            .with_expected_output("A complete blog article in markdown"),
        Stage::new(
            "social_create_content",
            prompts::SOCIAL_CREATE_CONTENT,
            workers.get(POST_WRITER)?,
        )
        .with_context("find_data")
        .with_expected_output("Three ready-to-publish social media posts"),
        Stage::new(
            "monitor_financial_news",
            prompts::MONITOR_FINANCIAL_NEWS,
            workers.get(FINANCIAL_SEARCH)?,
        )
        .with_expected_output("A list of recent financial news items with their sources"),
        Stage::new(
            "create_financial_content",
            prompts::CREATE_FINANCIAL_CONTENT,
            workers.get(FINANCIAL_WRITER)?,
        )
        .with_context("monitor_financial_news")
        .with_expected_output("A concise financial news briefing"),
        Stage::new("stock_research", prompts::STOCK_RESEARCH, workers.get(STOCK_RESEARCHER)?)
            .with_expected_output("a detailed research report with key metrics and analysis"),
        Stage::new("stock_analysis", prompts::STOCK_ANALYSIS, workers.get(STOCK_ANALYST)?)
            .with_context("stock_research")
            .with_expected_output(
                "a nicely formatted report on the stock fundamentals and competitive landscape",
            ),
        Stage::new("image_search", prompts::IMAGE_SEARCH, workers.get(IMAGE_SEARCHER)?)
            .with_expected_output(
                "a list containing two URLs of an image related to the given subject",
            ),
    ])
}

/// (kind, variant) -> pipeline
#[derive(Debug, Clone)]
pub struct PipelineCatalog {
    pipelines: HashMap<(PipelineKind, BackendVariant), Arc<Pipeline>>,
}

impl PipelineCatalog {
    /// Build every pipeline for both variants; any missing definition fails here
    pub fn standard(workers: &WorkerRegistry) -> PipelineResult<Self> {
        let mut pipelines = HashMap::new();
        for variant in BackendVariant::ALL {
            let stages = standard_stages(workers, variant)?;
            for kind in PipelineKind::ALL {
                let pipeline = Pipeline::from_registry(kind.id(), &stages, kind.stage_names())?;
                pipelines.insert((kind, variant), Arc::new(pipeline));
            }
        }
        tracing::info!(pipelines = pipelines.len(), "Pipeline catalogue built");
        Ok(Self { pipelines })
    }

    pub fn select(
        &self,
        kind: PipelineKind,
        variant: BackendVariant,
    ) -> PipelineResult<Arc<Pipeline>> {
        self.pipelines.get(&(kind, variant)).cloned().ok_or_else(|| {
            PipelineError::configuration(format!(
                "no '{}' pipeline for the {} backend",
                kind, variant
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
