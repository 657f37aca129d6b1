use async_trait::async_trait;
use formpilot_core::MemorySource;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

const API_KEY_HEADER: &str = "X-Workflow-Api-Key";

/// Company listing and memory lookup through two Retool workflow endpoints.
pub struct RetoolMemorySource {
    client: Client,
    list_url: String,
    memory_url: String,
    list_key: String,
    memory_key: String,
    request_timeout: Duration,
}

impl RetoolMemorySource {
    pub fn new(list_url: String, memory_url: String, list_key: String, memory_key: String) -> Self {
        info!("Creating RetoolMemorySource");
        Self {
            client: Client::new(),
            list_url,
            memory_url,
            list_key,
            memory_key,
            request_timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn post(&self, url: &str, key: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, key)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(response)
    }
}

/// Workflows return either a bare array or an object wrapping one.
fn company_list(response: Value) -> anyhow::Result<Vec<Value>> {
    match response {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => ["companies", "data", "result"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| anyhow::anyhow!("Company list response has no array")),
        other => anyhow::bail!("Unexpected company list response: {other}"),
    }
}

/// Numeric ids are sent as numbers, anything else as a string.
fn company_id_value(entity_id: &str) -> Value {
    entity_id
        .parse::<i64>()
        .map_or_else(|_| Value::String(entity_id.to_string()), Value::from)
}

#[async_trait]
impl MemorySource for RetoolMemorySource {
    async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>> {
        let response = self.post(&self.list_url, &self.list_key, &json!({})).await?;
        let companies = company_list(response)?;
        info!("Fetched {} companies", companies.len());
        Ok(companies)
    }

    async fn fetch_memory(&self, entity_id: &str) -> anyhow::Result<Value> {
        let body = json!({"company_id": company_id_value(entity_id)});
        let memory = self.post(&self.memory_url, &self.memory_key, &body).await?;
        info!("Fetched memory for company {entity_id}");
        Ok(memory)
    }
}
