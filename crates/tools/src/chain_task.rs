//! Hand the remaining work to a follow-up run.
//!
//! The agent loop treats this tool specially: its outcome ends the run
//! without critique, and `chained_instruction` tells the caller what the
//! next run should do.

use async_trait::async_trait;
use hearth_core::error::ToolError;
use hearth_core::outcome::ToolOutcome;
use hearth_core::tool::{CHAIN_TASK, RunContext, Tool};

pub struct ChainTaskTool;

#[async_trait]
impl Tool for ChainTaskTool {
    fn name(&self) -> &str {
        CHAIN_TASK
    }

    fn description(&self) -> &str {
        "Hand the rest of a large task to a follow-up run. Input: the instruction the follow-up \
         run should carry out. Ends the current run."
    }

    async fn invoke(&self, input: &str, _context: &RunContext) -> Result<ToolOutcome, ToolError> {
        let instruction = input.trim();
        if instruction.is_empty() {
            return Err(ToolError::InvalidArguments(
                "chain_task needs the instruction for the follow-up run".into(),
            ));
        }

        Ok(ToolOutcome::success(format!(
            "I've made progress and will continue in a follow-up step: {instruction}"
        ))
        .with_chained_instruction(instruction)
        .into())
    }
}
