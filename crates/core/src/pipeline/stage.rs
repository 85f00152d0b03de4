//! # Stage
//!
//! One unit of pipeline work: a description template, the worker that
//! executes it, and the earlier stages whose outputs it reads.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agents::Worker;
use crate::error::{PipelineError, PipelineResult};
use crate::runtime::ResolvedTask;

use super::template::{Payload, Template};

#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    description: Template,
    worker: Arc<Worker>,
    context: Vec<String>,
    expected_output: String,
}

impl Stage {
    pub fn new(name: impl Into<String>, description: &str, worker: Arc<Worker>) -> Self {
        Self {
            name: name.into(),
            description: Template::parse(description),
            worker,
            context: Vec::new(),
            expected_output: String::new(),
        }
    }

    /// Read the output of an earlier stage
    pub fn with_context(mut self, stage: impl Into<String>) -> Self {
        self.context.push(stage.into());
        self
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &Template {
        &self.description
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Placeholders the input payload has to supply
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.description
            .placeholders()
            .iter()
            .map(String::as_str)
            .filter(|p| !self.context.iter().any(|c| c.as_str() == *p))
    }

    /// Render the description against the payload and dependency outputs.
    ///
    /// A placeholder naming a dependency is replaced by its output. Every
    /// dependency not referenced that way is appended verbatim under a
    /// context heading.
    pub fn resolve(
        &self,
        input: &Payload,
        outputs: &HashMap<String, String>,
    ) -> PipelineResult<ResolvedTask> {
        for dependency in &self.context {
            if !outputs.contains_key(dependency) {
                return Err(PipelineError::configuration(format!(
                    "stage '{}' reads '{}' before it has run",
                    self.name, dependency
                )));
            }
        }

        let mut description = self
            .description
            .render(|key| {
                if self.context.iter().any(|c| c == key) {
                    outputs.get(key).map(String::as_str)
                } else {
                    input.get(key)
                }
            })
            .map_err(|placeholder| PipelineError::TemplateResolution {
                stage: self.name.clone(),
                placeholder,
            })?;

        let unreferenced: Vec<&String> = self
            .context
            .iter()
            .filter(|c| !self.description.references(c))
            .collect();
        if !unreferenced.is_empty() {
            description.push_str("\n\nContext from previous stages:");
            for dependency in unreferenced {
                if let Some(output) = outputs.get(dependency) {
                    description.push_str(&format!("\n\n### {}\n{}", dependency, output));
                }
            }
        }

        Ok(ResolvedTask {
            stage: self.name.clone(),
            description,
            expected_output: self.expected_output.clone(),
        })
    }
}
