//! Household tools for the hearth agent.
//!
//! Tools give the agent the ability to act for the user:
//! search recipes, keep a to-do list, collect gift ideas, and hand
//! oversized tasks to a follow-up run.
//!
//! List tools persist through an [`ArtifactStore`]; every mutation returns
//! the user's full artifact set so the caller sees what changed.

pub mod artifacts;
pub mod chain_task;
pub mod find_recipe;
pub mod input;
pub mod manage_gifts;
pub mod manage_planner;

use std::sync::Arc;

use hearth_core::error::ToolError;
use hearth_core::tool::{Tool, ToolRegistry};

pub use artifacts::{ArtifactStore, Artifacts, GiftIdea, InMemoryArtifactStore, TodoItem};
pub use chain_task::ChainTaskTool;
pub use find_recipe::FindRecipeTool;
pub use manage_gifts::ManageGiftsTool;
pub use manage_planner::ManagePlannerTool;

/// All built-in tools, sharing one artifact store.
pub fn builtin_tools(store: Arc<dyn ArtifactStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(FindRecipeTool),
        Arc::new(ManagePlannerTool::new(store.clone())),
        Arc::new(ManageGiftsTool::new(store)),
        Arc::new(ChainTaskTool),
    ]
}

/// Create the default tool registry with all built-in tools.
///
/// Fails if two tools share a name.
pub fn default_registry(store: Arc<dyn ArtifactStore>) -> Result<ToolRegistry, ToolError> {
    ToolRegistry::from_tools(builtin_tools(store))
}
