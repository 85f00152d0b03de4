//! # Toolbox Core
//!
//! The engine of the LLM Toolbox: workers, stages and the sequential
//! pipeline executor, plus the collaborators the workers reach through
//! their tools.
//!
//! ## Architecture
//!
//! - `agents/` - Worker personas and their registry
//! - `pipeline/` - Templates, stages, pipelines, executor and catalogue
//! - `runtime/` - Agent runtime trait and the radkit worker runtime
//! - `selection` - Process-wide backend variant register
//! - `tools/` - radkit tools (web search, scraping, images, fundamentals)
//! - `market/` - Market data, indicators and charts
//! - `papers/` - arXiv search and paper question answering
//! - `models` - LLM provider configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolbox_core::pipeline::{Payload, PipelineExecutor, PipelineKind};
//!
//! let pipeline = catalog.select(PipelineKind::Blog, selection.current()?)?;
//! let post = executor
//!     .run(&pipeline, &Payload::new().with("subject", "renewable energy"))
//!     .await?;
//! ```

pub mod agents;
pub mod error;
pub mod market;
pub mod models;
pub mod papers;
pub mod pipeline;
pub mod runtime;
pub mod selection;
pub mod tools;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{PipelineError, PipelineResult, StageFailure};
