//! Input parsing shared by the list-managing tools.
//!
//! The model hands tools a single string. List tools accept either a JSON
//! object (`{"operation": "add_todo", "text": "Buy milk"}`) or the shorthand
//! `operation: text`.

use hearth_core::error::ToolError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ToolInput {
    /// Lower-cased operation name.
    pub operation: String,
    /// Free text after the operation (shorthand) or the `text` field (JSON).
    pub text: String,
    fields: Map<String, Value>,
}

impl ToolInput {
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        let raw = raw.trim();

        let (operation, text, fields) = if raw.starts_with('{') {
            let fields: Map<String, Value> = serde_json::from_str(raw)
                .map_err(|e| ToolError::InvalidArguments(format!("Invalid JSON input: {e}")))?;
            let operation = fields
                .get("operation")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'operation' field".into()))?
                .to_string();
            let text = fields
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (operation, text, fields)
        } else if let Some((operation, text)) = raw.split_once(':') {
            (operation.to_string(), text.trim().to_string(), Map::new())
        } else {
            (raw.to_string(), String::new(), Map::new())
        };

        let operation = operation.trim().to_lowercase();
        if operation.is_empty() {
            return Err(ToolError::InvalidArguments("Missing operation".into()));
        }

        Ok(Self {
            operation,
            text,
            fields,
        })
    }

    /// A string field from JSON input; numbers are rendered as text.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The item id: the `id` field, or the shorthand text as a number.
    pub fn id(&self) -> Option<u64> {
        self.field("id")
            .unwrap_or_else(|| self.text.clone())
            .trim()
            .trim_start_matches('#')
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_input() {
        let input = ToolInput::parse(r#"{"operation": "Add_Todo", "text": "Buy milk"}"#).unwrap();
        assert_eq!(input.operation, "add_todo");
        assert_eq!(input.text, "Buy milk");
    }

    #[test]
    fn shorthand_input() {
        let input = ToolInput::parse("add_todo: Bake cookies: chocolate chip").unwrap();
        assert_eq!(input.operation, "add_todo");
        assert_eq!(input.text, "Bake cookies: chocolate chip");
    }

    #[test]
    fn bare_operation() {
        let input = ToolInput::parse("  list_todos ").unwrap();
        assert_eq!(input.operation, "list_todos");
        assert!(input.text.is_empty());
    }

    #[test]
    fn ids_from_field_or_text() {
        assert_eq!(ToolInput::parse(r#"{"operation":"complete_todo","id":3}"#).unwrap().id(), Some(3));
        assert_eq!(ToolInput::parse(r#"{"operation":"complete_todo","id":"4"}"#).unwrap().id(), Some(4));
        assert_eq!(ToolInput::parse("complete_todo: #2").unwrap().id(), Some(2));
        assert_eq!(ToolInput::parse("complete_todo: soon").unwrap().id(), None);
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(ToolInput::parse("{oops"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(
            ToolInput::parse(r#"{"text": "no op"}"#),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(ToolInput::parse("   ").is_err());
        assert!(ToolInput::parse(": text").is_err());
    }
}
