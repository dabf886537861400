//! Prompt text for the reasoning loop and the critic.

use hearth_core::tool::CHAIN_TASK;

/// The fixed system preamble: tool catalog, response contract, rules.
pub fn system_preamble(tool_catalog: &str) -> String {
    format!(
        r#"You are Hearth, a household assistant that solves requests step by step using tools.

Available tools:
{tool_catalog}

Respond with exactly one JSON object and nothing else. To call a tool:
{{"thought": "<your reasoning>", "action": "<tool name>", "action_input": "<input for the tool>"}}
To give the final answer:
{{"thought": "<your reasoning>", "final_answer": "<the answer for the user>"}}

Rules:
- Use only the tools listed above, one per response, and wait for its Observation.
- Base answers on Observations, not on guesses.
- Respect every constraint in the context and the request (allergies, diets, preferences).
- If a Critic entry rejected your answer, fix the stated problem before answering again.
- If the work is too large to finish now, call {CHAIN_TASK} with the remaining work."#
    )
}

/// The per-step prompt, rebuilt from scratch every iteration.
pub fn step_prompt(
    request: &str,
    context: &str,
    scratchpad: &str,
    step: u32,
    max_steps: u32,
) -> String {
    let context = if context.trim().is_empty() {
        "(none)"
    } else {
        context
    };
    let scratchpad = if scratchpad.is_empty() {
        "(empty)"
    } else {
        scratchpad
    };

    format!(
        "User request:\n{request}\n\nContext:\n{context}\n\nScratchpad:\n{scratchpad}\n\n\
         Step {step} of {max_steps}. Respond with the next JSON object."
    )
}

pub const CRITIC_SYSTEM: &str = "You review answers written by a household assistant before the user sees them. \
Reject an answer only when it ignores the request, contradicts the context, or is unsafe for the user. \
Reply with a single JSON object and nothing else.";

/// The critic's prompt for one proposed answer.
pub fn critic_prompt(request: &str, context: &str, answer: &str) -> String {
    let context = if context.trim().is_empty() {
        "(none)"
    } else {
        context
    };

    format!(
        "User request:\n{request}\n\nContext:\n{context}\n\nProposed answer:\n{answer}\n\n\
         Does the proposed answer satisfy the request and respect the context? Reply with \
         {{\"valid\": true}} or {{\"valid\": false, \"reason\": \"<what is wrong>\"}}."
    )
}

/// Instruction handed to a follow-up run when this one runs out of time.
pub fn continuation_instruction(request: &str, completed_actions: &[String]) -> String {
    if completed_actions.is_empty() {
        return format!("Continue the original request: {request}");
    }
    format!(
        "Continue the original request: {request}\nAlready done:\n{}",
        completed_actions
            .iter()
            .map(|a| format!("- {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_lists_tools_and_contract() {
        let preamble = system_preamble("- find_recipe: Search recipes");
        assert!(preamble.contains("- find_recipe: Search recipes"));
        assert!(preamble.contains(r#""final_answer""#));
        assert!(preamble.contains("chain_task"));
    }

    #[test]
    fn step_prompt_placeholders() {
        let prompt = step_prompt("Find cookies", "", "", 1, 10);
        assert!(prompt.contains("Context:\n(none)"));
        assert!(prompt.contains("Scratchpad:\n(empty)"));
        assert!(prompt.ends_with("Step 1 of 10. Respond with the next JSON object."));
    }

    #[test]
    fn step_prompt_replays_scratchpad() {
        let prompt = step_prompt("Find cookies", "Allergic to peanuts", "Thought: a\nAction: b", 2, 5);
        assert!(prompt.contains("Allergic to peanuts"));
        assert!(prompt.contains("Thought: a\nAction: b"));
        assert!(prompt.contains("Step 2 of 5"));
    }

    #[test]
    fn critic_prompt_carries_all_parts() {
        let prompt = critic_prompt("Find cookies", "Allergic to peanuts", "Peanut Butter Cookies");
        assert!(prompt.contains("Find cookies"));
        assert!(prompt.contains("Allergic to peanuts"));
        assert!(prompt.contains("Peanut Butter Cookies"));
        assert!(prompt.contains(r#"{"valid": true}"#));
    }

    #[test]
    fn continuation_mentions_done_work() {
        assert_eq!(
            continuation_instruction("Plan the party", &[]),
            "Continue the original request: Plan the party"
        );
        let text = continuation_instruction("Plan the party", &["find_recipe | Input: cake".into()]);
        assert!(text.contains("Already done:\n- find_recipe | Input: cake"));
    }
}
