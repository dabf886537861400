//! Provider router: builds the configured providers and picks the one the
//! agent talks to.
//!
//! Every named provider speaks the OpenAI-compatible protocol. When the
//! config lists `fallback` providers, the default provider is wrapped in a
//! [`FallbackProvider`] together with them.

use std::collections::HashMap;
use std::sync::Arc;

use hearth_config::AppConfig;
use hearth_core::error::ProviderError;
use hearth_core::provider::Provider;
use tracing::{debug, warn};

use crate::fallback::FallbackProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Holds the named providers built from config.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Build a router holding the default provider, every configured
    /// provider, and every provider named in the fallback list.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut router = Self::new(&config.default_provider);

        let names = std::iter::once(&config.default_provider)
            .chain(config.providers.keys())
            .chain(config.fallback.iter());

        for name in names {
            if router.providers.contains_key(name) {
                continue;
            }
            router.register(name.clone(), Arc::new(build_provider(config, name)));
        }

        router
    }
}

/// Build the provider the agent should use.
///
/// Returns the default provider alone, or a fallback chain starting with it
/// when `config.fallback` names further providers.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    chain_from(&ProviderRouter::from_config(config), config)
}

fn chain_from(
    router: &ProviderRouter,
    config: &AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let primary = router.default().ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "Default provider '{}' is not available",
            config.default_provider
        ))
    })?;

    if config.fallback.is_empty() {
        return Ok(primary);
    }

    // Attempts split each request's own timeout, so fallback happens inside
    // the stream and critic budgets.
    let mut chain = FallbackProvider::new("fallback").add(primary);
    let mut seen = vec![config.default_provider.as_str()];

    for name in &config.fallback {
        if seen.contains(&name.as_str()) {
            warn!(provider = %name, "Skipping duplicate fallback provider");
            continue;
        }
        match router.get(name) {
            Some(provider) => {
                chain = chain.add(provider);
                seen.push(name);
            }
            None => warn!(provider = %name, "Unknown fallback provider, skipping"),
        }
    }

    debug!(chain = ?chain.provider_names(), "Built provider fallback chain");
    Ok(Arc::new(chain))
}

fn build_provider(config: &AppConfig, name: &str) -> OpenAiCompatProvider {
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    let model = provider_config
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    OpenAiCompatProvider::new(name, base_url, api_key)
        .with_model(model)
        .with_temperature(config.default_temperature)
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_config::ProviderConfig;
    use hearth_core::provider::GenerationRequest;
    use std::time::Duration;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openrouter");
        let provider = Arc::new(OpenAiCompatProvider::openrouter("sk-test"));
        router.register("openrouter", provider);

        assert!(router.get("openrouter").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn provider_model_overrides_default_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                default_model: Some("llama3.1".into()),
                ..ProviderConfig::default()
            },
        );

        assert_eq!(build_provider(&config, "ollama").model(), "llama3.1");
        assert_eq!(build_provider(&config, "openai").model(), config.default_model);
    }

    #[test]
    fn fallback_list_builds_chain() {
        let mut config = AppConfig::default();
        config.fallback = vec!["openrouter".into(), "openai".into(), "ollama".into()];

        let router = ProviderRouter::from_config(&config);
        assert_eq!(router.list(), vec!["ollama", "openai", "openrouter"]);

        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "fallback");
    }

    struct Stalled;

    #[async_trait]
    impl Provider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<String, ProviderError> {
            std::future::pending().await
        }
    }

    struct Answering;

    #[async_trait]
    impl Provider for Answering {
        fn name(&self) -> &str {
            "answering"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<String, ProviderError> {
            Ok(r#"{"final_answer": "Flan"}"#.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_answers_inside_the_agent_budgets() {
        let mut config = AppConfig::default();
        config.default_provider = "stalled".into();
        config.fallback = vec!["answering".into()];

        let mut router = ProviderRouter::new("stalled");
        router.register("stalled", Arc::new(Stalled));
        router.register("answering", Arc::new(Answering));
        let provider = chain_from(&router, &config).unwrap();

        let stream_timeout = Duration::from_millis(config.agent.stream_timeout_ms);
        let mut rx = tokio::time::timeout(
            stream_timeout,
            provider.generate_stream(GenerationRequest::new("plan", stream_timeout)),
        )
        .await
        .expect("fallback must open a stream before the stream timeout")
        .unwrap();
        assert!(rx.recv().await.unwrap().unwrap().contains("Flan"));

        let critic_timeout = Duration::from_millis(config.agent.critic_timeout_ms);
        let verdict = tokio::time::timeout(
            critic_timeout,
            provider.generate(GenerationRequest::new("critique", critic_timeout)),
        )
        .await
        .expect("fallback must answer before the critic timeout");
        assert!(verdict.is_ok());
    }
}
