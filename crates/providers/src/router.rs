//! Provider router — selects the correct generation provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use aisha_core::provider::Provider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;
use tracing::warn;

/// Routes generation requests to the configured provider.
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

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Names with no built-in endpoint and no `api_url` are skipped;
/// `AppConfig::validate` rejects such configs before they get here.
pub fn build_from_config(config: &aisha_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        if let Some(provider) = build_provider(name, provider_config.api_url.as_deref(), &api_key) {
            router.register(name.clone(), provider);
        }
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        if let Some(provider) = build_provider(&config.default_provider, None, &api_key) {
            router.register(config.default_provider.clone(), provider);
        }
    }

    router
}

fn build_provider(name: &str, api_url: Option<&str>, api_key: &str) -> Option<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match name {
        "gemini" | "google" => {
            let mut p = GeminiProvider::new(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "openai" => {
            let mut p = OpenAiCompatProvider::openai(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "ollama" => Arc::new(OpenAiCompatProvider::ollama(api_url)),
        _ => {
            let Some(base_url) = api_url.map(String::from).or_else(|| default_base_url(name)) else {
                warn!(provider = name, "Unknown provider without api_url, skipping");
                return None;
            };
            Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
        }
    };
    Some(provider)
}

/// Get the default base URL for well-known completion endpoints.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
