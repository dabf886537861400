//! Progress snapshots pushed to an optional caller-supplied sink.
//!
//! The executor reports after every state transition. Reporting is
//! best-effort: a sink that errors or panics is logged and ignored, and a
//! single report never holds the loop for longer than the progress interval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Starting,
    Thinking,
    Tool,
    Finalizing,
    Error,
    Done,
}

/// One snapshot of a running loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProgress {
    pub step: u32,
    pub max_steps: u32,
    pub status: ProgressStatus,
    pub message: String,
    pub transcript_so_far: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tool_used: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("progress sink is full")]
    Full,

    #[error("progress listener disconnected")]
    Closed,

    #[error("progress sink failed: {0}")]
    Other(String),
}

/// A sink for progress snapshots.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, progress: AgentProgress) -> Result<(), ProgressError>;
}

/// Pushes snapshots into a bounded channel without waiting.
pub struct ChannelReporter {
    tx: mpsc::Sender<AgentProgress>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<AgentProgress>) -> Self {
        Self { tx }
    }

    /// Create a reporter and the receiver that reads from it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AgentProgress>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProgressReporter for ChannelReporter {
    async fn report(&self, progress: AgentProgress) -> Result<(), ProgressError> {
        self.tx.try_send(progress).map_err(|e| match e {
            TrySendError::Full(_) => ProgressError::Full,
            TrySendError::Closed(_) => ProgressError::Closed,
        })
    }
}
