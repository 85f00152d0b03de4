//! # Test Doubles
//!
//! A scripted agent runtime for exercising pipelines without model or
//! network access. Compiled for tests and behind the
//! `testing` feature for dependent crates.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::agents::Worker;
use crate::runtime::{AgentRuntime, ResolvedTask};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Echo,
    Fail(String),
    Hang,
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub worker: String,
    pub task: ResolvedTask,
}

/// Agent runtime answering per stage name.
///
/// Unscripted stages reply `output of <stage>`.
#[derive(Debug, Default)]
pub struct ScriptedRuntime {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, stage: &str, output: &str) -> Self {
        self.scripts
            .insert(stage.to_string(), Script::Reply(output.to_string()));
        self
    }

    /// Reply with the resolved description
    pub fn echo(mut self, stage: &str) -> Self {
        self.scripts.insert(stage.to_string(), Script::Echo);
        self
    }

    pub fn fail(mut self, stage: &str, message: &str) -> Self {
        self.scripts
            .insert(stage.to_string(), Script::Fail(message.to_string()));
        self
    }

    /// Never complete
    pub fn hang(mut self, stage: &str) -> Self {
        self.scripts.insert(stage.to_string(), Script::Hang);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, stage: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.task.stage == stage)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn invoke(&self, worker: &Worker, task: &ResolvedTask) -> anyhow::Result<String> {
        lock(&self.calls).push(RecordedCall {
            worker: worker.id().to_string(),
            task: task.clone(),
        });

        match self.scripts.get(&task.stage) {
            Some(Script::Reply(output)) => Ok(output.clone()),
            Some(Script::Echo) => Ok(task.description.clone()),
            Some(Script::Fail(message)) => Err(anyhow::anyhow!("{}", message)),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(format!("output of {}", task.stage)),
        }
    }
}
