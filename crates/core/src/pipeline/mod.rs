//! # Pipelines
//!
//! Sequential multi-stage generation: stages bound to workers, composed
//! into pipelines, run by the executor.
//!
//! ## Modules
//!
//! - `template` - Placeholder templates and input payloads
//! - `stage` - Stage definition and resolution
//! - `registry` - Stage lookup
//! - `definition` - Validated pipelines
//! - `executor` - The sequential run loop
//! - `events` - Progress events
//! - `catalog` - The standard pipelines per backend variant
//! - `prompts` - Bundled stage descriptions

pub mod catalog;
pub mod definition;
pub mod events;
pub mod executor;
pub mod prompts;
pub mod registry;
pub mod stage;
pub mod template;

pub use catalog::{PipelineCatalog, PipelineKind};
pub use definition::{ExecutionMode, Pipeline};
pub use events::{PipelineEvent, PipelineEventKind};
pub use executor::{PipelineExecutor, DEFAULT_STAGE_TIMEOUT};
pub use registry::StageRegistry;
pub use stage::Stage;
pub use template::{Payload, Template};
