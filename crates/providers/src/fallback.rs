//! Provider fallback: try an ordered chain until one provider answers.
//!
//! The chain has no timeouts of its own. It spends the budget each request
//! already carries (`GenerationRequest::timeout`): every attempt gets an equal
//! share of what is left, so a provider that hangs still leaves time for the
//! ones after it, and a provider that fails fast passes its unused share on.
//!
//! For streams the budget only bounds opening the stream. Once chunks flow,
//! a mid-stream failure belongs to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hearth_core::error::ProviderError;
use hearth_core::provider::{ChunkReceiver, GenerationRequest, Provider};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Wraps an ordered list of providers and moves down it on failure.
pub struct FallbackProvider {
    name: String,
    chain: Vec<Arc<dyn Provider>>,
}

impl FallbackProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append a provider to the end of the chain.
    pub fn add(mut self, provider: Arc<dyn Provider>) -> Self {
        self.chain.push(provider);
        self
    }

    /// Names of the chained providers, in order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.chain.iter().map(|p| p.name()).collect()
    }

    async fn first_success<T, F, Fut>(
        &self,
        budget: Duration,
        mut attempt: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut(Arc<dyn Provider>, Duration) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let deadline = Instant::now() + budget;
        let mut last_error = ProviderError::NotConfigured("No providers in fallback chain".into());

        for (i, provider) in self.chain.iter().enumerate() {
            let share = attempt_share(deadline, self.chain.len() - i);
            if share.is_zero() {
                warn!(provider = %provider.name(), "Request budget spent before fallback");
                return Err(ProviderError::Timeout(format!(
                    "Budget of {}ms spent before trying '{}'",
                    budget.as_millis(),
                    provider.name()
                )));
            }

            debug!(
                provider = %provider.name(),
                attempt = i + 1,
                share_ms = share.as_millis() as u64,
                "Trying provider"
            );

            match tokio::time::timeout(share, attempt(provider.clone(), share)).await {
                Ok(Ok(value)) => {
                    if i > 0 {
                        info!(provider = %provider.name(), attempt = i + 1, "Fallback provider answered");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    warn!(provider = %provider.name(), error = %e, "Provider failed");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        provider = %provider.name(),
                        share_ms = share.as_millis() as u64,
                        "Provider did not answer within its share of the budget"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "'{}' did not answer within {}ms",
                        provider.name(),
                        share.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }
}

/// An equal split of the time left before `deadline`.
fn attempt_share(deadline: Instant, providers_left: usize) -> Duration {
    let left = u32::try_from(providers_left).unwrap_or(u32::MAX).max(1);
    deadline.saturating_duration_since(Instant::now()) / left
}

#[async_trait]
impl Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        self.first_success(request.timeout, |provider, share| {
            let mut request = request.clone();
            request.timeout = share;
            async move { provider.generate(request).await }
        })
        .await
    }

    /// The child keeps the caller's chunk timeout; only opening is bounded
    /// by the share.
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkReceiver, ProviderError> {
        self.first_success(request.timeout, |provider, _share| {
            let request = request.clone();
            async move { provider.generate_stream(request).await }
        })
        .await
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        for provider in &self.chain {
            if let Ok(true) = provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
