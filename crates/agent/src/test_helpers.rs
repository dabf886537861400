//! Shared test helpers for executor and critic tests.

use hearth_core::error::ProviderError;
use hearth_core::provider::{ChunkReceiver, GenerationRequest, Provider};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply: chunks, an optional delay, or a failure.
#[derive(Debug, Clone)]
pub struct MockReply {
    chunks: Vec<String>,
    delay: Duration,
    error: Option<ProviderError>,
    stall: bool,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::chunks(vec![text.into()])
    }

    pub fn chunks(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            delay: Duration::ZERO,
            error: None,
            stall: false,
        }
    }

    pub fn failure(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            ..Self::chunks(vec![])
        }
    }

    /// Sends `prefix`, then keeps the stream open without sending more.
    pub fn stalled(prefix: impl Into<String>) -> Self {
        Self {
            stall: true,
            ..Self::text(prefix)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A tool-call step as the model would write it.
pub fn tool_call(action: &str, input: &str) -> MockReply {
    MockReply::text(
        serde_json::json!({
            "thought": format!("I should use {action}"),
            "action": action,
            "action_input": input,
        })
        .to_string(),
    )
}

/// A final-answer step as the model would write it.
pub fn answer(text: &str) -> MockReply {
    MockReply::text(
        serde_json::json!({
            "thought": "I have what I need",
            "final_answer": text,
        })
        .to_string(),
    )
}

pub fn accept() -> MockReply {
    MockReply::text(r#"{"valid": true}"#)
}

pub fn reject(reason: &str) -> MockReply {
    MockReply::text(serde_json::json!({ "valid": false, "reason": reason }).to_string())
}

/// A mock provider that plays back scripted replies.
///
/// Streaming calls (reasoning steps) consume `replies`; single-shot calls
/// (critic) consume `verdicts` and accept once those run out. Running out
/// of reasoning replies is reported as an API error.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<MockReply>>,
    verdicts: Mutex<VecDeque<MockReply>>,
    prompts: Mutex<Vec<String>>,
    critic_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            verdicts: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            critic_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_verdicts(self, verdicts: Vec<MockReply>) -> Self {
        *self.verdicts.lock().unwrap() = verdicts.into();
        self
    }

    /// Number of reasoning (streaming) calls made.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn critic_prompts(&self) -> Vec<String> {
        self.critic_prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        self.critic_prompts.lock().unwrap().push(request.prompt);
        let reply = self.verdicts.lock().unwrap().pop_front();
        let Some(reply) = reply else {
            return Ok(r#"{"valid": true}"#.into());
        };

        tokio::time::sleep(reply.delay).await;
        match reply.error {
            Some(e) => Err(e),
            None => Ok(reply.chunks.concat()),
        }
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkReceiver, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let reply = self.replies.lock().unwrap().pop_front();
        let Some(reply) = reply else {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "ScriptedProvider: no more replies".into(),
            });
        };

        tokio::time::sleep(reply.delay).await;
        if let Some(e) = reply.error {
            return Err(e);
        }

        let (tx, rx) = tokio::sync::mpsc::channel(reply.chunks.len() + 1);
        for chunk in reply.chunks {
            let _ = tx.send(Ok(chunk)).await;
        }
        if reply.stall {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
        }
        Ok(rx)
    }
}
