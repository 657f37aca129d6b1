use async_trait::async_trait;
use formpilot_core::{ChatMessage, LLMProvider, LLMResponse, Role, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::retry::{ENGINE_RETRY_DELAYS, retry_with_backoff};

const API_VERSION: &str = "2023-06-01";

/// Reasoning engine backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    request_timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String) -> Self {
        info!("Creating AnthropicProvider: model={model}");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model,
            max_tokens: 4096,
            temperature: 0.0,
            request_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Messages API body: system turns are joined into the top-level
    /// `system` field, the rest become the message list.
    fn build_request(&self, messages: &[ChatMessage], model: &str) -> Value {
        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let turns = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect::<Vec<_>>();

        let mut request = json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": turns,
        });
        if !system.is_empty() {
            request["system"] = Value::String(system);
        }
        request
    }

    fn parse_response(response: &Value) -> anyhow::Result<LLMResponse> {
        let blocks = response["content"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?;

        let content = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect::<String>();

        if content.is_empty() {
            anyhow::bail!("Invalid response format: no text content");
        }

        let usage = response["usage"].as_object().map(|u| {
            let read = |key: &str| {
                u32::try_from(u.get(key).and_then(Value::as_u64).unwrap_or(0)).unwrap_or(0)
            };
            let prompt_tokens = read("input_tokens");
            let completion_tokens = read("output_tokens");
            Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens.saturating_add(completion_tokens),
            }
        });

        Ok(LLMResponse { content, usage })
    }

    async fn try_send(&self, request: &Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Self::parse_response(&response)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("Anthropic API key is not configured");
        }

        let request = self.build_request(messages, model);
        info!("Sending request to Anthropic API: model={model}");

        let response = retry_with_backoff(|| self.try_send(&request), &ENGINE_RETRY_DELAYS).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Anthropic usage: prompt={}, completion={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        info!("Received response from Anthropic API");
        Ok(response)
    }

    fn get_default_model(&self) -> &str {
        &self.model
    }
}
