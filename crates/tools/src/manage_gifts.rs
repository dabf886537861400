//! Gift idea list, scoped to the calling user.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::error::ToolError;
use hearth_core::outcome::ToolOutcome;
use hearth_core::tool::{RunContext, Tool};
use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::input::ToolInput;

pub struct ManageGiftsTool {
    store: Arc<dyn ArtifactStore>,
}

impl ManageGiftsTool {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ManageGiftsTool {
    fn name(&self) -> &str {
        "manage_gifts"
    }

    fn description(&self) -> &str {
        "Manage the user's gift ideas. Operations: add_gift, list_gifts, remove_gift. \
         Input: JSON like {\"operation\": \"add_gift\", \"recipient\": \"Mom\", \"idea\": \"Silk scarf\"} \
         or shorthand \"add_gift: Mom | Silk scarf\". list_gifts takes an optional recipient; remove_gift takes the id."
    }

    async fn invoke(&self, input: &str, context: &RunContext) -> Result<ToolOutcome, ToolError> {
        let input = ToolInput::parse(input)?;
        let mut artifacts = self.store.load(&context.user_id).await?;

        let outcome = match input.operation.as_str() {
            "add_gift" => {
                let (recipient, idea) = recipient_and_idea(&input)?;
                let id = artifacts.add_gift(&recipient, &idea);
                info!(user = %context.user_id, id, "Added gift idea");
                ToolOutcome::success(format!("Saved gift idea #{id} for {recipient}: {idea}"))
            }
            "list_gifts" => {
                let recipient = input
                    .field("recipient")
                    .unwrap_or_else(|| input.text.clone())
                    .to_lowercase();
                let matching: Vec<_> = artifacts
                    .gifts
                    .iter()
                    .filter(|g| recipient.is_empty() || g.recipient.to_lowercase() == recipient)
                    .collect();
                let listing = if matching.is_empty() {
                    "No gift ideas saved".to_string()
                } else {
                    matching
                        .iter()
                        .map(|g| format!("#{} {}: {}", g.id, g.recipient, g.idea))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                return Ok(ToolOutcome::success(listing)
                    .with_field("gifts", serde_json::to_value(&matching).unwrap_or_default())
                    .into());
            }
            "remove_gift" => {
                let id = input.id().ok_or_else(|| {
                    ToolError::InvalidArguments("remove_gift needs a numeric id".into())
                })?;
                let before = artifacts.gifts.len();
                artifacts.gifts.retain(|g| g.id != id);
                if artifacts.gifts.len() == before {
                    return Ok(ToolOutcome::failure(format!("No gift idea with id {id}")).into());
                }
                ToolOutcome::success(format!("Removed gift idea #{id}"))
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Unknown operation '{other}'. Use add_gift, list_gifts or remove_gift"
                )));
            }
        };

        self.store.save(&context.user_id, &artifacts).await?;
        Ok(outcome.with_artifacts(artifacts.to_value()).into())
    }
}

fn recipient_and_idea(input: &ToolInput) -> Result<(String, String), ToolError> {
    let (recipient, idea) = match (input.field("recipient"), input.field("idea")) {
        (Some(recipient), Some(idea)) => (recipient, idea),
        _ => input
            .text
            .split_once('|')
            .map(|(r, i)| (r.to_string(), i.to_string()))
            .ok_or_else(|| {
                ToolError::InvalidArguments(
                    "add_gift needs a recipient and an idea, e.g. \"add_gift: Mom | Silk scarf\"".into(),
                )
            })?,
    };

    let (recipient, idea) = (recipient.trim().to_string(), idea.trim().to_string());
    if recipient.is_empty() || idea.is_empty() {
        return Err(ToolError::InvalidArguments(
            "add_gift needs a non-empty recipient and idea".into(),
        ));
    }
    Ok((recipient, idea))
}
