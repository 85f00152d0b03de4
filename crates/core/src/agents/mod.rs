//! # Agents
//!
//! Workers and the registry they are looked up from.
//!
//! ## Modules
//!
//! - `worker` - The immutable worker persona
//! - `registry` - Name to worker lookup
//! - `definitions` - The standard workers

pub mod definitions;
pub mod registry;
pub mod worker;

pub use definitions::{standard_registry, standard_workers};
pub use registry::WorkerRegistry;
pub use worker::Worker;
