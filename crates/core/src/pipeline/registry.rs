//! Named lookup of stages. One registry exists per backend variant,
//! since the same stage name may be bound to different workers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};

use super::Stage;

#[derive(Debug, Default, Clone)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<Stage>>,
}

impl StageRegistry {
    pub fn from_stages(stages: impl IntoIterator<Item = Stage>) -> PipelineResult<Self> {
        let mut map = HashMap::new();
        for stage in stages {
            let name = stage.name().to_string();
            if map.insert(name.clone(), Arc::new(stage)).is_some() {
                return Err(PipelineError::configuration(format!(
                    "duplicate stage '{}'",
                    name
                )));
            }
        }
        Ok(Self { stages: map })
    }

    pub fn get(&self, name: &str) -> PipelineResult<Arc<Stage>> {
        self.stages
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::configuration(format!("unknown stage '{}'", name)))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
