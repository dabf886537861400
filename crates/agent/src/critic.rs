//! Critic: an independent second pass over a proposed final answer.
//!
//! The critic fails open. If its own call errors, times out, or returns
//! something unparsable, the answer is accepted and the failure is logged.

use std::sync::Arc;
use std::time::Duration;

use hearth_core::provider::{GenerationRequest, Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::parser::extract_json_object;
use crate::prompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticVerdict {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CriticVerdict {
    pub fn accept() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    /// Parse a verdict out of the critic's raw reply.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = extract_json_object(raw)?;
        let valid = match value.get("valid")? {
            Value::Bool(b) => *b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            _ => return None,
        };

        if valid {
            return Some(Self::accept());
        }

        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("The answer does not satisfy the request.");
        Some(Self::reject(reason))
    }
}

pub struct Critic {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

impl Critic {
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Review `answer` against the original request and context.
    pub async fn review(&self, request: &str, context: &str, answer: &str) -> CriticVerdict {
        let generation = GenerationRequest::new(
            prompt::critic_prompt(request, context, answer),
            self.timeout,
        )
        .with_system(prompt::CRITIC_SYSTEM);

        let raw = match tokio::time::timeout(self.timeout, self.provider.generate(generation)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "Critic call failed, accepting answer");
                return CriticVerdict::accept();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Critic timed out, accepting answer"
                );
                return CriticVerdict::accept();
            }
        };

        match CriticVerdict::parse(&raw) {
            Some(verdict) => {
                debug!(valid = verdict.valid, reason = ?verdict.reason, "Critic verdict");
                verdict
            }
            None => {
                warn!(raw = %raw, "Unparsable critic verdict, accepting answer");
                CriticVerdict::accept()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockReply, ScriptedProvider};
    use hearth_core::error::ProviderError;

    fn critic(provider: ScriptedProvider) -> Critic {
        Critic::new(Arc::new(provider), Duration::from_secs(10))
    }

    #[test]
    fn parse_verdicts() {
        assert_eq!(CriticVerdict::parse(r#"{"valid": true}"#), Some(CriticVerdict::accept()));
        assert_eq!(
            CriticVerdict::parse(r#"```json
{"valid": false, "reason": "User is allergic to peanuts."}
```"#),
            Some(CriticVerdict::reject("User is allergic to peanuts."))
        );
        assert_eq!(
            CriticVerdict::parse(r#"{"valid": "false"}"#).unwrap().reason.as_deref(),
            Some("The answer does not satisfy the request.")
        );
        assert_eq!(CriticVerdict::parse(r#"{"valid": "maybe"}"#), None);
        assert_eq!(CriticVerdict::parse("looks fine to me"), None);
    }

    #[tokio::test]
    async fn rejection_passes_through() {
        let provider = ScriptedProvider::new(vec![]).with_verdicts(vec![MockReply::text(
            r#"{"valid": false, "reason": "User is allergic to peanuts."}"#,
        )]);
        let verdict = critic(provider).review("cookies", "peanut allergy", "PB cookies").await;
        assert_eq!(verdict, CriticVerdict::reject("User is allergic to peanuts."));
    }

    #[tokio::test]
    async fn provider_error_fails_open() {
        let provider = ScriptedProvider::new(vec![]).with_verdicts(vec![MockReply::failure(
            ProviderError::Network("connection reset".into()),
        )]);
        assert!(critic(provider).review("q", "", "a").await.valid);
    }

    #[tokio::test]
    async fn garbage_fails_open() {
        let provider = ScriptedProvider::new(vec![])
            .with_verdicts(vec![MockReply::text("I cannot judge this.")]);
        assert!(critic(provider).review("q", "", "a").await.valid);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_open() {
        let provider = ScriptedProvider::new(vec![]).with_verdicts(vec![MockReply::text(
            r#"{"valid": false, "reason": "too slow to matter"}"#,
        )
        .delayed(Duration::from_secs(60))]);
        let critic = Critic::new(Arc::new(provider), Duration::from_millis(500));
        assert!(critic.review("q", "", "a").await.valid);
    }

    #[tokio::test]
    async fn prompt_contains_request_context_and_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let critic = Critic::new(provider.clone(), Duration::from_secs(1));
        critic.review("Find cookies", "Allergic to peanuts", "PB cookies").await;

        let prompts = provider.critic_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Find cookies"));
        assert!(prompts[0].contains("Allergic to peanuts"));
        assert!(prompts[0].contains("PB cookies"));
    }
}
