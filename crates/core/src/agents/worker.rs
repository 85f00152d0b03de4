//! # Worker
//!
//! A named persona (role, goal, backstory) with an optional backend and the
//! tools it may use. Workers are immutable once built and shared by every
//! pipeline that references them.

use crate::models::ModelConfig;
use crate::tools::Tool;

#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    id: String,
    role: String,
    goal: String,
    backstory: String,
    tools: Vec<Tool>,
    backend: Option<ModelConfig>,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            backend: None,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        if !self.tools.contains(&tool) {
            self.tools.push(tool);
        }
        self
    }

    /// Bind this worker to a backend; unbound workers use the runtime default
    pub fn with_backend(mut self, backend: ModelConfig) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn has_tool(&self, tool: Tool) -> bool {
        self.tools.contains(&tool)
    }

    pub fn backend(&self) -> Option<&ModelConfig> {
        self.backend.as_ref()
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}
