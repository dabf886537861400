//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what let the agent change the world on the user's behalf:
//! search recipes, edit a to-do list, hand work to a follow-up run.
//! The reasoning loop never knows a tool's internals; it only sees the
//! name, a one-line description, and the [`ToolOutcome`] envelope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::outcome::ToolOutcome;

/// Name of the tool that hands remaining work to a follow-up run. The loop
/// ends the run when it is called, without critique.
pub const CHAIN_TASK: &str = "chain_task";

/// Opaque caller identity handed unmodified to every tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub user_id: String,
    pub scenario: String,
}

impl RunContext {
    pub fn new(user_id: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            scenario: scenario.into(),
        }
    }
}

/// The core Tool trait.
///
/// Each tool (find_recipe, manage_planner, chain_task, ...) implements this
/// trait and is registered in a [`ToolRegistry`] built once at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "find_recipe").
    fn name(&self) -> &str;

    /// A description of what this tool does and what input it expects
    /// (shown to the model in the tool catalog).
    fn description(&self) -> &str;

    /// Invoke the tool with the model-supplied input string.
    async fn invoke(&self, input: &str, context: &RunContext) -> Result<ToolOutcome, ToolError>;
}

/// A registry of available tools.
///
/// Immutable once built: the registry is shared read-only (behind an `Arc`)
/// across every concurrent run.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Build a registry from a list of tools, rejecting duplicate names.
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Look up a tool by name, failing with [`ToolError::NotFound`].
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// The tool catalog as `- name: description` lines, sorted by name.
    pub fn catalog(&self) -> String {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
