//! Provider trait: the abstraction over content-generation backends.
//!
//! A Provider turns a prompt (plus an optional system instruction) into
//! text, either in one piece or as a stream of incremental chunks.
//! Every call carries an explicit timeout; nothing here may block forever.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;

/// Receiving half of a streamed generation: finite, not restartable.
pub type ChunkReceiver = mpsc::Receiver<Result<String, ProviderError>>;

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The prompt text.
    pub prompt: String,

    /// Optional system instruction sent alongside the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// For single-shot calls, the whole-call budget. For streams, the
    /// longest allowed gap before the first chunk and between chunks.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            timeout,
        }
    }

    /// Set the system instruction.
    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// The core Provider trait.
///
/// The agent loop calls `generate_stream()` for reasoning steps and
/// `generate()` for critique, without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get the complete text back.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError>;

    /// Send a request and get a stream of text chunks.
    ///
    /// Default implementation calls `generate()` and wraps the result as a single chunk.
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkReceiver, ProviderError> {
        let text = self.generate(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
