//! User artifacts (to-dos and gift ideas) and the store that holds them.
//!
//! Tools load a user's artifact set, change it, and save it back. The store
//! does not coordinate concurrent runs for the same user: last write wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::error::ToolError;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Everything a single user has saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default)]
    pub todos: Vec<TodoItem>,

    #[serde(default)]
    pub gifts: Vec<GiftIdea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftIdea {
    pub id: u64,
    pub recipient: String,
    pub idea: String,
}

impl Artifacts {
    /// Append a to-do and return its id.
    pub fn add_todo(&mut self, text: impl Into<String>) -> u64 {
        let id = self.todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.todos.push(TodoItem {
            id,
            text: text.into(),
            done: false,
            created_at: Utc::now(),
        });
        id
    }

    /// Append a gift idea and return its id.
    pub fn add_gift(&mut self, recipient: impl Into<String>, idea: impl Into<String>) -> u64 {
        let id = self.gifts.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        self.gifts.push(GiftIdea {
            id,
            recipient: recipient.into(),
            idea: idea.into(),
        });
        id
    }

    /// The artifact set as a JSON value, for tool outcomes.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Per-user artifact persistence.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Load a user's artifacts; unknown users start empty.
    async fn load(&self, user_id: &str) -> Result<Artifacts, ToolError>;

    /// Replace a user's artifacts.
    async fn save(&self, user_id: &str, artifacts: &Artifacts) -> Result<(), ToolError>;
}

/// An in-memory store keyed by user id.
/// Useful for testing and for the CLI, where nothing outlives the process.
pub struct InMemoryArtifactStore {
    users: Arc<RwLock<HashMap<String, Artifacts>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of users with saved artifacts.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, user_id: &str) -> Result<Artifacts, ToolError> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, user_id: &str, artifacts: &Artifacts) -> Result<(), ToolError> {
        self.users
            .write()
            .await
            .insert(user_id.to_string(), artifacts.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_user_loads_empty() {
        let store = InMemoryArtifactStore::new();
        let artifacts = store.load("nobody").await.unwrap();
        assert_eq!(artifacts, Artifacts::default());
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn save_and_load_per_user() {
        let store = InMemoryArtifactStore::new();

        let mut alice = Artifacts::default();
        alice.add_todo("Buy flour");
        store.save("alice", &alice).await.unwrap();

        let mut bob = Artifacts::default();
        bob.add_gift("Mom", "Silk scarf");
        store.save("bob", &bob).await.unwrap();

        assert_eq!(store.load("alice").await.unwrap().todos[0].text, "Buy flour");
        assert!(store.load("alice").await.unwrap().gifts.is_empty());
        assert_eq!(store.load("bob").await.unwrap().gifts[0].idea, "Silk scarf");
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = InMemoryArtifactStore::new();

        let mut first = Artifacts::default();
        first.add_todo("first");
        let mut second = Artifacts::default();
        second.add_todo("second");

        store.save("u", &first).await.unwrap();
        store.save("u", &second).await.unwrap();

        let loaded = store.load("u").await.unwrap();
        assert_eq!(loaded.todos.len(), 1);
        assert_eq!(loaded.todos[0].text, "second");
    }

    #[test]
    fn ids_increase_after_removal() {
        let mut artifacts = Artifacts::default();
        assert_eq!(artifacts.add_todo("a"), 1);
        assert_eq!(artifacts.add_todo("b"), 2);
        artifacts.todos.retain(|t| t.id != 1);
        assert_eq!(artifacts.add_todo("c"), 3);
    }

    #[test]
    fn value_shape() {
        let mut artifacts = Artifacts::default();
        artifacts.add_gift("Dad", "Chess set");
        let value = artifacts.to_value();
        assert_eq!(value["gifts"][0]["recipient"], "Dad");
        assert!(value["todos"].as_array().unwrap().is_empty());
    }
}
