//! To-do list management, scoped to the calling user.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::error::ToolError;
use hearth_core::outcome::ToolOutcome;
use hearth_core::tool::{RunContext, Tool};
use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::input::ToolInput;

pub struct ManagePlannerTool {
    store: Arc<dyn ArtifactStore>,
}

impl ManagePlannerTool {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ManagePlannerTool {
    fn name(&self) -> &str {
        "manage_planner"
    }

    fn description(&self) -> &str {
        "Manage the user's to-do list. Operations: add_todo, list_todos, complete_todo, remove_todo. \
         Input: JSON like {\"operation\": \"add_todo\", \"text\": \"Buy flour\"} or shorthand \"add_todo: Buy flour\". \
         complete_todo and remove_todo take the item id."
    }

    async fn invoke(&self, input: &str, context: &RunContext) -> Result<ToolOutcome, ToolError> {
        let input = ToolInput::parse(input)?;
        let mut artifacts = self.store.load(&context.user_id).await?;

        let outcome = match input.operation.as_str() {
            "add_todo" => {
                let text = input.text.trim();
                if text.is_empty() {
                    return Err(ToolError::InvalidArguments("add_todo needs text".into()));
                }
                let id = artifacts.add_todo(text);
                info!(user = %context.user_id, id, "Added todo");
                ToolOutcome::success(format!("Added to-do #{id}: {text}"))
            }
            "list_todos" => {
                let listing = if artifacts.todos.is_empty() {
                    "The to-do list is empty".to_string()
                } else {
                    artifacts
                        .todos
                        .iter()
                        .map(|t| {
                            let mark = if t.done { "x" } else { " " };
                            format!("[{mark}] #{} {}", t.id, t.text)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                // Reads report the list but leave artifacts untouched.
                return Ok(ToolOutcome::success(listing)
                    .with_field("todos", serde_json::to_value(&artifacts.todos).unwrap_or_default())
                    .into());
            }
            "complete_todo" => {
                let id = require_id(&input)?;
                match artifacts.todos.iter_mut().find(|t| t.id == id) {
                    Some(todo) => {
                        todo.done = true;
                        ToolOutcome::success(format!("Completed to-do #{id}: {}", todo.text))
                    }
                    None => return Ok(ToolOutcome::failure(format!("No to-do with id {id}")).into()),
                }
            }
            "remove_todo" => {
                let id = require_id(&input)?;
                let before = artifacts.todos.len();
                artifacts.todos.retain(|t| t.id != id);
                if artifacts.todos.len() == before {
                    return Ok(ToolOutcome::failure(format!("No to-do with id {id}")).into());
                }
                ToolOutcome::success(format!("Removed to-do #{id}"))
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Unknown operation '{other}'. Use add_todo, list_todos, complete_todo or remove_todo"
                )));
            }
        };

        self.store.save(&context.user_id, &artifacts).await?;
        Ok(outcome.with_artifacts(artifacts.to_value()).into())
    }
}

fn require_id(input: &ToolInput) -> Result<u64, ToolError> {
    input.id().ok_or_else(|| {
        ToolError::InvalidArguments(format!("{} needs a numeric id", input.operation))
    })
}
