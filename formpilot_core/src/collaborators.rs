//! Contracts for the services the form pipeline talks to but does not own.
//!
//! Every method is fallible; callers decide whether a failure propagates
//! (PDF rendering, transcription) or degrades to an empty value (memory
//! lookups).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Payload handed to a PDF renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub title: String,
    pub font_size: u32,
    pub text_color: String,
    /// Canonical form with display defaults applied.
    pub data: Value,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, template_id: &str, request: &RenderRequest) -> anyhow::Result<Vec<u8>>;
}

#[async_trait]
pub trait MemorySource: Send + Sync {
    async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>>;

    async fn fetch_memory(&self, entity_id: &str) -> anyhow::Result<Value>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: PdfRenderer + ?Sized> PdfRenderer for Arc<T> {
    async fn render(&self, template_id: &str, request: &RenderRequest) -> anyhow::Result<Vec<u8>> {
        (**self).render(template_id, request).await
    }
}

#[async_trait]
impl<T: MemorySource + ?Sized> MemorySource for Arc<T> {
    async fn fetch_companies(&self) -> anyhow::Result<Vec<Value>> {
        (**self).fetch_companies().await
    }

    async fn fetch_memory(&self, entity_id: &str) -> anyhow::Result<Value> {
        (**self).fetch_memory(entity_id).await
    }
}

#[async_trait]
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> anyhow::Result<String> {
        (**self).transcribe(audio, file_name).await
    }
}
