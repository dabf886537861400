//! Scratchpad: the append-only transcript of a single run.
//!
//! Every line is replayed verbatim into the next prompt, so entries are
//! never edited or removed once pushed. Only observations are length-capped,
//! and that happens before they get here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Data Structures ───────────────────────────────────────────────────────

/// The kind of scratchpad entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Thought,
    Action,
    Observation,
    Critic,
    SystemNote,
    FinalAnswer,
}

impl EntryKind {
    /// Line prefix used when rendering.
    pub fn label(self) -> &'static str {
        match self {
            Self::Thought => "Thought",
            Self::Action => "Action",
            Self::Observation => "Observation",
            Self::Critic => "Critic",
            Self::SystemNote => "System",
            Self::FinalAnswer => "Final Answer",
        }
    }
}

/// A single rendered line of the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchpadEntry {
    pub kind: EntryKind,
    pub line: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scratchpad {
    entries: Vec<ScratchpadEntry>,
}

// ── Implementation ────────────────────────────────────────────────────────

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thought(&mut self, thought: &str) {
        self.push(EntryKind::Thought, thought);
    }

    pub fn action(&mut self, tool: &str, input: &str) {
        self.push(EntryKind::Action, &format!("{tool} | Input: {input}"));
    }

    pub fn observation(&mut self, observation: &str) {
        self.push(EntryKind::Observation, observation);
    }

    /// An observation recording that the tool failed.
    pub fn tool_error(&mut self, message: &str) {
        self.push(
            EntryKind::Observation,
            &format!("Tool Execution Error - {message}"),
        );
    }

    pub fn critic_rejection(&mut self, reason: &str) {
        self.push(
            EntryKind::Critic,
            &format!("Your proposed answer was rejected. Reason: {reason}"),
        );
    }

    pub fn system_note(&mut self, note: &str) {
        self.push(EntryKind::SystemNote, note);
    }

    pub fn final_answer(&mut self, answer: &str) {
        self.push(EntryKind::FinalAnswer, answer);
    }

    fn push(&mut self, kind: EntryKind, content: &str) {
        self.entries.push(ScratchpadEntry {
            kind,
            line: format!("{}: {}", kind.label(), content),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[ScratchpadEntry] {
        &self.entries
    }

    /// All lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.line.clone()).collect()
    }

    /// Lines joined for prompt injection.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_order_and_prefixes() {
        let mut pad = Scratchpad::new();
        pad.thought("I should search for cookies");
        pad.action("find_recipe", "cookies");
        pad.observation("{\"success\":true}");
        pad.critic_rejection("User is allergic to peanuts.");
        pad.system_note("Invalid JSON returned.");
        pad.final_answer("Chocolate Chip Cookies");

        assert_eq!(
            pad.lines(),
            vec![
                "Thought: I should search for cookies",
                "Action: find_recipe | Input: cookies",
                "Observation: {\"success\":true}",
                "Critic: Your proposed answer was rejected. Reason: User is allergic to peanuts.",
                "System: Invalid JSON returned.",
                "Final Answer: Chocolate Chip Cookies",
            ]
        );
    }

    #[test]
    fn tool_errors_count_as_observations() {
        let mut pad = Scratchpad::new();
        pad.action("manage_planner", "add_todo:");
        pad.tool_error("add_todo needs text");

        let observations = pad
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Observation)
            .count();
        assert_eq!(observations, 1);
        assert_eq!(
            pad.lines()[1],
            "Observation: Tool Execution Error - add_todo needs text"
        );
    }

    #[test]
    fn render_joins_lines() {
        let mut pad = Scratchpad::new();
        assert!(pad.render().is_empty());
        pad.thought("a");
        pad.thought("b");
        assert_eq!(pad.render(), "Thought: a\nThought: b");
        assert_eq!(pad.entries().len(), 2);
    }

    #[test]
    fn serializes_entry_kinds_snake_case() {
        let mut pad = Scratchpad::new();
        pad.system_note("note");
        let json = serde_json::to_string(&pad).unwrap();
        assert!(json.contains(r#""kind":"system_note""#));
    }
}
