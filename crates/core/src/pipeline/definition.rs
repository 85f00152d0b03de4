//! # Pipeline Definition
//!
//! An ordered, non-empty list of stages. Built once, shared across
//! requests, holds no per-run state.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

use super::{Payload, Stage, StageRegistry};

/// How stages are scheduled within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Each stage starts after its predecessor completes
    #[default]
    Sequential,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<Stage>>,
    mode: ExecutionMode,
}

impl Pipeline {
    /// Validate and build a pipeline.
    ///
    /// Stage names must be unique and every dependency must name an
    /// earlier stage.
    pub fn new(name: impl Into<String>, stages: Vec<Arc<Stage>>) -> PipelineResult<Self> {
        let name = name.into();
        if stages.is_empty() {
            return Err(PipelineError::configuration(format!(
                "pipeline '{}' has no stages",
                name
            )));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for stage in &stages {
            for dependency in stage.context() {
                if !seen.contains(dependency.as_str()) {
                    return Err(PipelineError::configuration(format!(
                        "stage '{}' in pipeline '{}' depends on '{}', which does not run before it",
                        stage.name(),
                        name,
                        dependency
                    )));
                }
            }
            if !seen.insert(stage.name()) {
                return Err(PipelineError::configuration(format!(
                    "stage '{}' appears twice in pipeline '{}'",
                    stage.name(),
                    name
                )));
            }
        }

        Ok(Self {
            name,
            stages,
            mode: ExecutionMode::Sequential,
        })
    }

    /// Build from stage names looked up in a registry
    pub fn from_registry(
        name: impl Into<String>,
        registry: &StageRegistry,
        stage_names: &[&str],
    ) -> PipelineResult<Self> {
        let stages = stage_names
            .iter()
            .map(|s| registry.get(s))
            .collect::<PipelineResult<Vec<_>>>()?;
        Self::new(name, stages)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Arc<Stage>] {
        &self.stages
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Input keys any stage needs, sorted
    pub fn required_inputs(&self) -> BTreeSet<&str> {
        self.stages
            .iter()
            .flat_map(|s| s.required_inputs())
            .collect()
    }

    /// Every missing key at once, before any stage runs
    pub fn validate_input(&self, input: &Payload) -> PipelineResult<()> {
        let missing: Vec<String> = self
            .required_inputs()
            .into_iter()
            .filter(|key| !input.contains(key))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::MissingInput { keys: missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Worker;

    fn stage(name: &str, description: &str) -> Stage {
        Stage::new(name, description, Arc::new(Worker::new("w", "r", "g", "b")))
    }

    #[test]
    fn test_required_inputs_across_stages() {
        let pipeline = Pipeline::new(
            "fundamental_analysis",
            vec![
                Arc::new(stage("research", "Research {ticker}")),
                Arc::new(stage("analysis", "Explain {ticker} for {audience}").with_context("research")),
            ],
        )
        .unwrap();
        let required: Vec<&str> = pipeline.required_inputs().into_iter().collect();
        assert_eq!(required, vec!["audience", "ticker"]);
        assert_eq!(pipeline.mode(), ExecutionMode::Sequential);
    }

    #[test]
    fn test_validate_input_lists_all_missing_keys() {
        let pipeline = Pipeline::new(
            "p",
            vec![Arc::new(stage("a", "{ticker} {subject}"))],
        )
        .unwrap();
        let err = pipeline.validate_input(&Payload::new().with("subject", "")).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingInput {
                keys: vec!["subject".into(), "ticker".into()]
            }
        );
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(Pipeline::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_forward_dependency_rejected() {
        let err = Pipeline::new(
            "p",
            vec![
                Arc::new(stage("a", "x").with_context("b")),
                Arc::new(stage("b", "y")),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("depends on 'b'"));
    }

    #[test]
    fn test_duplicate_stage_in_pipeline_rejected() {
        let s = Arc::new(stage("a", "x"));
        assert!(Pipeline::new("p", vec![s.clone(), s]).is_err());
    }
}
