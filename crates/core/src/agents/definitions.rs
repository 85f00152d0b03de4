//! # Worker Definitions
//!
//! The standard personas the content, finance and paper pipelines are
//! composed from. Workers without an explicit backend run on the
//! runtime's default (primary) model.

use crate::error::PipelineResult;
use crate::models::BackendModels;
use crate::tools::Tool;

use super::{Worker, WorkerRegistry};

pub const WEB_SEARCH: &str = "web_search_agent";
pub const WEB_SEARCH_GROQ: &str = "web_search_agent_groq";
pub const BLOG_WRITER: &str = "blog_content_creator_agent";
pub const POST_WRITER: &str = "post_content_creator_agent";
pub const FINANCIAL_SEARCH: &str = "financial_search_agent";
pub const FINANCIAL_WRITER: &str = "financial_content_creator_agent";
pub const STOCK_RESEARCHER: &str = "stock_researcher";
pub const STOCK_ANALYST: &str = "stock_analyst";
pub const IMAGE_SEARCHER: &str = "image_searcher";
pub const PAPER_ASSISTANT: &str = "paper_assistant";

/// Web researcher
///
/// Finds current, verifiable sources on a subject. The alternate variant
/// binds the same persona to the alternate backend.
fn web_researcher(id: &str) -> Worker {
    Worker::new(
        id,
        "Senior Web Researcher",
        "Find the most relevant and recent information about the requested subject on the web",
        "You are an experienced researcher who knows how to search the web efficiently, \
         open the most promising pages and separate facts from noise. You always keep \
         track of where each piece of information came from.",
    )
    .with_tool(Tool::WebSearch)
    .with_tool(Tool::ScrapeWebsite)
}

fn blog_writer() -> Worker {
    Worker::new(
        BLOG_WRITER,
        "Blog Content Creator",
        "Write an engaging, well-structured blog article based on the research provided",
        "You are a professional content writer with years of experience turning research \
         notes into articles people enjoy reading. You write clear headings, short \
         paragraphs and you never invent facts that are not in your sources.",
    )
}

fn post_writer() -> Worker {
    Worker::new(
        POST_WRITER,
        "Social Media Content Creator",
        "Write short, catchy social media posts based on the research provided",
        "You are a social media specialist who knows how to condense a topic into a few \
         punchy lines with the right tone and hashtags for each platform.",
    )
}

fn financial_researcher() -> Worker {
    Worker::new(
        FINANCIAL_SEARCH,
        "Financial News Researcher",
        "Monitor and collect the latest financial news about a sector or country",
        "You are a financial journalist's research assistant. You track markets daily and \
         know which sources publish reliable, timely financial news.",
    )
    .with_tool(Tool::WebSearch)
    .with_tool(Tool::ScrapeWebsite)
}

fn financial_writer() -> Worker {
    Worker::new(
        FINANCIAL_WRITER,
        "Financial Content Creator",
        "Summarize financial news into a concise, informative briefing",
        "You are a financial writer who explains market movements in plain language \
         without losing precision.",
    )
}

fn stock_researcher() -> Worker {
    Worker::new(
        STOCK_RESEARCHER,
        "Stock Market Researcher",
        "Gather and analyze comprehensive fundamental data about the stock",
        "You're an experienced stock market researcher with a keen eye for detail and a \
         talent for uncovering hidden trends.",
    )
    .with_tool(Tool::Fundamentals)
}

fn stock_analyst() -> Worker {
    Worker::new(
        STOCK_ANALYST,
        "Financial Analyst",
        "Analyze the gathered data and provide investment insights and provide a nice \
         formatted summary report",
        "You're a seasoned financial analyst known for your accurate predictions and \
         ability to synthesize complex information.",
    )
}

fn image_searcher() -> Worker {
    Worker::new(
        IMAGE_SEARCHER,
        "Image Searcher",
        "Generate a sentence that is related to a context and use the tool to acquire images",
        "An AI assistant specialized in searching for images on Lexica.art",
    )
    .with_tool(Tool::ImageSearch)
}

/// Answers questions about indexed papers from retrieved excerpts
fn paper_assistant() -> Worker {
    Worker::new(
        PAPER_ASSISTANT,
        "Research Paper Assistant",
        "Answer questions about scientific papers using only the excerpts provided",
        "You are a careful scientific reader. When the excerpts do not contain the answer \
         you say so instead of guessing.",
    )
}

/// Every standard worker
pub fn standard_workers(models: &BackendModels) -> Vec<Worker> {
    vec![
        web_researcher(WEB_SEARCH),
        web_researcher(WEB_SEARCH_GROQ).with_backend(models.alternate.clone()),
        blog_writer(),
        post_writer(),
        financial_researcher(),
        financial_writer(),
        stock_researcher(),
        stock_analyst(),
        image_searcher(),
        paper_assistant(),
    ]
}

pub fn standard_registry(models: &BackendModels) -> PipelineResult<WorkerRegistry> {
    WorkerRegistry::from_workers(standard_workers(models))
}
