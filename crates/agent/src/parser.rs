//! Decision parser: raw generated text to a tagged [`Decision`].
//!
//! The model is asked for one JSON object per step, but it regularly wraps
//! it in markdown fences or adds chatter around it. Parsing tries, in order:
//!
//! 1. Strip code fences and parse the whole text strictly.
//! 2. Parse the span from the first `{` to the last `}`.
//!
//! An object with neither `action` nor `final_answer` is a [`ParseFailure`],
//! which the loop records as a system note rather than raising.

use serde_json::{Map, Value};

/// What the model decided to do this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    ToolCall {
        thought: String,
        action: String,
        action_input: String,
    },
    FinalAnswer {
        thought: String,
        answer: String,
    },
}

impl Decision {
    pub fn thought(&self) -> &str {
        match self {
            Self::ToolCall { thought, .. } | Self::FinalAnswer { thought, .. } => thought,
        }
    }
}

/// Recoverable parse failure with a diagnostic for the scratchpad.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct ParseFailure {
    pub diagnostic: String,
}

impl ParseFailure {
    fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

/// Parse one step's generated text.
///
/// When an object carries both `action` and `final_answer`, the tool call
/// wins: the model is asked for one or the other, and acting first keeps
/// the observation in the transcript.
pub fn parse_decision(raw: &str) -> Result<Decision, ParseFailure> {
    if raw.trim().is_empty() {
        return Err(ParseFailure::new("The response was empty"));
    }

    let value = extract_json_object(raw)
        .ok_or_else(|| ParseFailure::new("The response did not contain a valid JSON object"))?;
    let Value::Object(object) = value else {
        return Err(ParseFailure::new("The response was JSON but not an object"));
    };

    let thought = text_field(&object, "thought").unwrap_or_default();

    if let Some(action) = text_field(&object, "action").filter(|a| !a.trim().is_empty()) {
        let action_input = text_field(&object, "action_input")
            .or_else(|| text_field(&object, "actionInput"))
            .unwrap_or_default();
        return Ok(Decision::ToolCall {
            thought,
            action: action.trim().to_string(),
            action_input,
        });
    }

    match text_field(&object, "final_answer") {
        Some(answer) if !answer.trim().is_empty() => Ok(Decision::FinalAnswer { thought, answer }),
        Some(_) => Err(ParseFailure::new("The \"final_answer\" field was empty")),
        None => Err(ParseFailure::new(
            "The JSON object had neither an \"action\" nor a \"final_answer\" field",
        )),
    }
}

/// Find a JSON object in free text: fenced, bare, or embedded in prose.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let stripped = strip_code_fences(raw);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(stripped.trim()) {
        return Some(value);
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return Some(value);
            }
        }
    }

    None
}

fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A field as text. Strings pass through; other non-null values are
/// rendered as compact JSON so structured tool input survives.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
