use async_trait::async_trait;
use formpilot_core::{
    CanonicalForm, FieldSpec, LLMProvider, SchemaRegistry, sanitize, strip_code_fences,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::prompt::{EXTRACTION_SYSTEM_PROMPT, build_extraction_prompt};
use super::{FieldExtractor, assemble};
use crate::error::ExtractionFailure;

/// Extraction through the reasoning engine.
pub struct ReasoningExtractor {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<SchemaRegistry>,
    timeout: Duration,
}

impl ReasoningExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            provider,
            registry,
            timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn ask(&self, prompt: &str) -> Result<String, ExtractionFailure> {
        let call = self.provider.complete(EXTRACTION_SYSTEM_PROMPT, prompt);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionFailure::EngineError(format!("{e:#}"))),
            Err(_) => Err(ExtractionFailure::EngineTimeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl FieldExtractor for ReasoningExtractor {
    async fn extract(
        &self,
        raw: &Value,
        spec: &FieldSpec,
    ) -> Result<CanonicalForm, ExtractionFailure> {
        let sanitized = sanitize(raw);
        let prompt = build_extraction_prompt(&sanitized, spec);
        info!("Extracting {} fields with the reasoning engine", spec.len());
        debug!("Extraction prompt is {} bytes", prompt.len());

        let reply = self.ask(&prompt).await.inspect_err(|e| {
            warn!("Extraction engine call failed: {e}");
        })?;

        let parsed: Value = serde_json::from_str(strip_code_fences(&reply))
            .map_err(|e| ExtractionFailure::MalformedOutput(format!("not valid JSON: {e}")))?;

        let form = assemble(&self.registry, spec, &parsed).inspect_err(|e| {
            warn!("Rejected extraction output: {e}");
        })?;

        info!("Extraction produced {} fields", form.len());
        Ok(form)
    }

    fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}
