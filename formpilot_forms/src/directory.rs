use formpilot_core::{MemorySource, sanitize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::FormError;

/// Company listing and memory lookup.
///
/// The browsing calls degrade to an empty list or object on source errors,
/// timeouts or a missing source. [`CompanyDirectory::fetch_memory`] reports
/// those failures instead, for callers that must not act on empty memory.
pub struct CompanyDirectory {
    source: Option<Arc<dyn MemorySource>>,
    timeout: Duration,
}

impl CompanyDirectory {
    pub fn new(source: Arc<dyn MemorySource>) -> Self {
        Self {
            source: Some(source),
            timeout: Duration::from_secs(30),
        }
    }

    /// Directory with no backing source.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            source: None,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    pub async fn list_companies(&self) -> Vec<Value> {
        let Some(source) = &self.source else {
            warn!("No memory source configured, returning no companies");
            return Vec::new();
        };
        match tokio::time::timeout(self.timeout, source.fetch_companies()).await {
            Ok(Ok(companies)) => companies,
            Ok(Err(e)) => {
                warn!("Company list lookup failed: {e:#}");
                Vec::new()
            }
            Err(_) => {
                warn!("Company list lookup timed out");
                Vec::new()
            }
        }
    }

    /// Sanitized memory for one company, or why it could not be loaded.
    pub async fn fetch_memory(&self, entity_id: &str) -> Result<Value, FormError> {
        let Some(source) = &self.source else {
            return Err(FormError::Upstream(
                "no company memory source configured".to_string(),
            ));
        };
        match tokio::time::timeout(self.timeout, source.fetch_memory(entity_id)).await {
            Ok(Ok(memory)) => {
                info!("Loaded memory for company {entity_id}");
                Ok(sanitize(&memory))
            }
            Ok(Err(e)) => Err(FormError::upstream(
                &format!("memory lookup for company {entity_id} failed"),
                &e,
            )),
            Err(_) => Err(FormError::Upstream(format!(
                "memory lookup for company {entity_id} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    /// Sanitized memory for one company, empty when the lookup fails.
    pub async fn company_memory(&self, entity_id: &str) -> Value {
        self.fetch_memory(entity_id).await.unwrap_or_else(|e| {
            warn!("Returning empty memory for company {entity_id}: {e}");
            Value::Object(Map::new())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Failing;

    #[async_trait]
    impl MemorySource for Failing {
        async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>> {
            anyhow::bail!("workflow down")
        }

        async fn fetch_memory(&self, _: &str) -> anyhow::Result<Value> {
            anyhow::bail!("workflow down")
        }
    }

    struct Stalled;

    #[async_trait]
    impl MemorySource for Stalled {
        async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn fetch_memory(&self, _: &str) -> anyhow::Result<Value> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Value::Null)
        }
    }

    struct Fixed;

    #[async_trait]
    impl MemorySource for Fixed {
        async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>> {
            Ok(vec![json!({"id": 7, "name": "Acme"})])
        }

        async fn fetch_memory(&self, _: &str) -> anyhow::Result<Value> {
            Ok(json!({
                "company": {"company_name": "Acme", "md": "# notes"},
                "phone_events": []
            }))
        }
    }

    #[tokio::test]
    async fn failures_degrade_to_empty() {
        let directory = CompanyDirectory::new(Arc::new(Failing));
        assert!(directory.list_companies().await.is_empty());
        assert_eq!(directory.company_memory("7").await, json!({}));

        let unconfigured = CompanyDirectory::empty();
        assert!(!unconfigured.is_configured());
        assert!(unconfigured.list_companies().await.is_empty());
    }

    #[tokio::test]
    async fn strict_fetch_reports_failures() {
        let failing = CompanyDirectory::new(Arc::new(Failing));
        assert!(matches!(
            failing.fetch_memory("7").await,
            Err(FormError::Upstream(message)) if message.contains("workflow down")
        ));

        assert!(matches!(
            CompanyDirectory::empty().fetch_memory("7").await,
            Err(FormError::Upstream(_))
        ));

        let stalled = CompanyDirectory::new(Arc::new(Stalled))
            .with_timeout(Duration::from_millis(20));
        assert!(matches!(
            stalled.fetch_memory("7").await,
            Err(FormError::Upstream(message)) if message.contains("timed out")
        ));
        assert_eq!(stalled.company_memory("7").await, json!({}));
    }

    #[tokio::test]
    async fn memory_is_sanitized() {
        let directory = CompanyDirectory::new(Arc::new(Fixed));
        assert_eq!(directory.list_companies().await.len(), 1);
        assert_eq!(
            directory.company_memory("7").await,
            json!({"company": {"company_name": "Acme"}})
        );
        assert!(matches!(
            directory.fetch_memory("7").await,
            Ok(memory) if memory == json!({"company": {"company_name": "Acme"}})
        ));
    }
}
