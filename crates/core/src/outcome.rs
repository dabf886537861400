//! Tool outcomes: the envelope every tool invocation returns.
//!
//! A tool either answers with plain text or with a structured object. The
//! loop only understands the envelope fields (`success`, `message`,
//! `artifacts`, `chained_instruction`); anything else a tool wants to report
//! rides along in `extra` and is replayed to the model verbatim.

use serde::{Deserialize, Serialize};

/// Suffix appended to observations that were cut to fit the prompt.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// What a tool returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    /// Plain text, passed to the scratchpad unchanged.
    Text(String),

    /// A structured envelope, serialised (and length-capped) for the scratchpad.
    Structured(StructuredOutcome),
}

/// The structured form of a tool outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The caller's updated artifact set. Its presence is what marks a run
    /// as having changed user data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<serde_json::Value>,

    /// Set by `chain_task`: the instruction a follow-up run should execute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chained_instruction: Option<String>,

    /// Tool-specific fields outside the envelope.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolOutcome {
    /// A plain-text outcome.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// A structured outcome with `success: true` and a message.
    pub fn success(message: impl Into<String>) -> StructuredOutcome {
        StructuredOutcome {
            success: Some(true),
            message: Some(message.into()),
            ..StructuredOutcome::default()
        }
    }

    /// A structured outcome with `success: false` and a message.
    pub fn failure(message: impl Into<String>) -> StructuredOutcome {
        StructuredOutcome {
            success: Some(false),
            message: Some(message.into()),
            ..StructuredOutcome::default()
        }
    }

    /// The human-facing message, if the outcome has one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(s) => s.message.as_deref(),
        }
    }

    /// The updated artifact set, if the tool reported one.
    pub fn artifacts(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Text(_) => None,
            Self::Structured(s) => s.artifacts.as_ref(),
        }
    }

    /// The follow-up instruction set by a chaining tool.
    pub fn chained_instruction(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Structured(s) => s.chained_instruction.as_deref(),
        }
    }

    /// Normalize the outcome into an observation line body.
    ///
    /// Text passes through unchanged. Structured outcomes are serialised to
    /// JSON and cut to `max_chars` characters, followed by
    /// [`TRUNCATION_MARKER`] when anything was dropped.
    pub fn render(&self, max_chars: usize) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(s) => {
                let json = serde_json::to_string(s).unwrap_or_else(|e| {
                    format!("{{\"message\":\"unserializable tool outcome: {e}\"}}")
                });
                truncate_chars(&json, max_chars)
            }
        }
    }
}

impl From<StructuredOutcome> for ToolOutcome {
    fn from(outcome: StructuredOutcome) -> Self {
        Self::Structured(outcome)
    }
}

impl From<String> for ToolOutcome {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ToolOutcome {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl StructuredOutcome {
    /// Attach the caller's updated artifact set.
    pub fn with_artifacts(mut self, artifacts: serde_json::Value) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Attach a follow-up instruction.
    pub fn with_chained_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.chained_instruction = Some(instruction.into());
        self
    }

    /// Attach a tool-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Cut `text` to at most `max_chars` characters, appending the marker if cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}
