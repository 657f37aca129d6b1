use async_trait::async_trait;
use formpilot_core::{PdfRenderer, RenderRequest};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// PDF renderer backed by Anvil's fill endpoint.
pub struct AnvilRenderer {
    client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
}

impl AnvilRenderer {
    pub fn new(api_key: String) -> Self {
        info!("Creating AnvilRenderer");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://app.useanvil.com".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn fill_url(&self, template_id: &str) -> String {
        format!(
            "{}/api/v1/fill/{template_id}.pdf",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PdfRenderer for AnvilRenderer {
    async fn render(&self, template_id: &str, request: &RenderRequest) -> anyhow::Result<Vec<u8>> {
        info!("Filling PDF template {template_id}");

        let response = self
            .client
            .post(self.fill_url(template_id))
            .basic_auth(&self.api_key, Some(""))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anvil fill failed with {status}: {body}");
        }

        let bytes = response.bytes().await?;
        info!("Received {} PDF bytes from Anvil", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fill_url_is_template_scoped() {
        let renderer = AnvilRenderer::new("k".to_string())
            .with_base_url("https://anvil.example/".to_string());
        assert_eq!(
            renderer.fill_url("tmpl123"),
            "https://anvil.example/api/v1/fill/tmpl123.pdf"
        );
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn request_serializes_in_camel_case() {
        let request = RenderRequest {
            title: "Acord 125".to_string(),
            font_size: 10,
            text_color: "#333333".to_string(),
            data: json!({"agency": ""}),
        };
        let body = serde_json::to_value(&request).expect("serializable");
        assert_eq!(body["fontSize"], 10);
        assert_eq!(body["textColor"], "#333333");
        assert_eq!(body["data"]["agency"], "");
    }
}
