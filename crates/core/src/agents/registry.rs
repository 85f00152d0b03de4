//! Named lookup of workers, populated once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use super::Worker;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Default, Clone)]
pub struct WorkerRegistry {
    workers: HashMap<String, Arc<Worker>>,
}

impl WorkerRegistry {
    /// Build a registry; a repeated id is a configuration error
    pub fn from_workers(workers: impl IntoIterator<Item = Worker>) -> PipelineResult<Self> {
        let mut map = HashMap::new();
        for worker in workers {
            let id = worker.id().to_string();
            if map.insert(id.clone(), Arc::new(worker)).is_some() {
                return Err(PipelineError::configuration(format!(
                    "duplicate worker '{}'",
                    id
                )));
            }
        }
        Ok(Self { workers: map })
    }

    pub fn get(&self, id: &str) -> PipelineResult<Arc<Worker>> {
        self.workers
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::configuration(format!("unknown worker '{}'", id)))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.workers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
