//! OpenAI-compatible text-completion provider.
//!
//! Works with: OpenAI (`gpt-3.5-turbo-instruct`), vLLM, llama.cpp server,
//! Ollama, Together AI, and any endpoint exposing the legacy
//! `/v1/completions` API. The prompt is sent as raw text so the model
//! continues directly after the response prefix.

use async_trait::async_trait;
use aisha_core::error::ProviderError;
use aisha_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{http_client, status_error, transport_error};

/// An OpenAI-compatible completions provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    /// Send `top_k`; the official OpenAI API rejects it, most local servers accept it.
    send_top_k: bool,
    /// Fail fast with `NotConfigured` when no key is set; local servers need none.
    requires_key: bool,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            send_top_k: true,
            requires_key: false,
            client: http_client(),
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        let mut provider =
            Self::new("openai", "https://api.openai.com/v1", api_key).with_top_k(false);
        provider.requires_key = true;
        provider
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Point at a different endpoint (proxy, Azure-style gateway, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn ensure_key(&self) -> Result<(), ProviderError> {
        if self.requires_key && self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "{} requires an API key",
                self.name
            )));
        }
        Ok(())
    }

    /// Whether to include `top_k` in requests.
    pub fn with_top_k(mut self, enabled: bool) -> Self {
        self.send_top_k = enabled;
        self
    }

    fn to_api_request(&self, request: &GenerationRequest) -> CompletionRequest {
        CompletionRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            top_k: self.send_top_k.then_some(request.params.top_k),
            max_tokens: request.params.max_output_tokens,
            stream: false,
        }
    }

    fn parse_response(
        api: CompletionResponse,
        requested_model: &str,
    ) -> Result<GenerationResponse, ProviderError> {
        let choice = api
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let usage = api.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(GenerationResponse {
            text: choice.text,
            model: api.model.unwrap_or_else(|| requested_model.to_string()),
            usage,
        })
    }
}

#[async_trait]
impl aisha_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        self.ensure_key()?;
        let url = format!("{}/completions", self.base_url);
        let body = self.to_api_request(&request);

        debug!(provider = %self.name, model = %request.model, prompt_len = request.prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(status_error(status, error_body));
        }

        let api_response: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_response, &request.model)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.ensure_key()?;
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

// ── Completions API wire types ────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
