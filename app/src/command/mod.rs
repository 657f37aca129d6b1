//! Static strategy pattern for CLI commands.
//!
//! Each command is its own strategy type with its own input, dispatched
//! statically from `main`.

use formpilot_config::{Config, EngineKind, ExtractionStrategy};
use formpilot_core::{LLMProvider, SchemaRegistry};
use formpilot_forms::{
    CommandInterpreter, CompanyDirectory, FieldExtractor, FormArtifacts, FormService,
    KeyPathExtractor, ReasoningExtractor, RenderSettings,
};
use formpilot_providers::{
    AnthropicProvider, AnvilRenderer, OpenAiProvider, RetoolMemorySource, WhisperTranscriber,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod extract;
mod init;
mod serve;
mod version;

pub use extract::{ExtractInput, ExtractStrategy};
pub use init::InitStrategy;
pub use serve::{ServeInput, ServeStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Reasoning engine from config, `None` without credentials.
fn build_engine(config: &Config) -> Option<Arc<dyn LLMProvider>> {
    let engine = &config.engine;
    if !engine.has_credentials() {
        warn!(
            "No reasoning engine key (set {} or engine.api_key); extraction will fail and edits use the fallback",
            engine.api_key_env()
        );
        return None;
    }

    let timeout = Duration::from_secs(engine.timeout_secs);
    let provider: Arc<dyn LLMProvider> = match engine.provider {
        EngineKind::Anthropic => {
            let mut provider =
                AnthropicProvider::new(engine.api_key.clone(), engine.model.clone())
                    .with_max_tokens(engine.max_tokens)
                    .with_temperature(engine.temperature)
                    .with_request_timeout(timeout);
            if let Some(base_url) = &engine.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        EngineKind::OpenAi => {
            let mut provider = OpenAiProvider::new(engine.api_key.clone(), engine.model.clone())
                .with_max_tokens(engine.max_tokens)
                .with_temperature(engine.temperature)
                .with_request_timeout(timeout);
            if let Some(base_url) = &engine.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
    };
    Some(provider)
}

/// Extraction strategy; the reasoning strategy without an engine still
/// reports engine errors rather than silently switching strategies.
fn build_extractor(
    config: &Config,
    registry: &Arc<SchemaRegistry>,
    engine: Option<&Arc<dyn LLMProvider>>,
    offline: bool,
) -> Arc<dyn FieldExtractor> {
    let timeout = Duration::from_secs(config.engine.timeout_secs);
    match (offline, config.extraction.strategy, engine) {
        (true, _, _) | (false, ExtractionStrategy::KeyPath, _) => {
            info!("Using key-path extraction");
            Arc::new(KeyPathExtractor::new(Arc::clone(registry)))
        }
        (false, ExtractionStrategy::Reasoning, Some(engine)) => Arc::new(
            ReasoningExtractor::new(Arc::clone(engine), Arc::clone(registry)).with_timeout(timeout),
        ),
        (false, ExtractionStrategy::Reasoning, None) => Arc::new(
            ReasoningExtractor::new(Arc::new(MissingEngine), Arc::clone(registry))
                .with_timeout(timeout),
        ),
    }
}

/// Stand-in engine that fails every call.
struct MissingEngine;

#[async_trait::async_trait]
impl LLMProvider for MissingEngine {
    async fn chat(
        &self,
        _messages: &[formpilot_core::ChatMessage],
        _model: &str,
    ) -> anyhow::Result<formpilot_core::LLMResponse> {
        anyhow::bail!("reasoning engine is not configured")
    }

    fn get_default_model(&self) -> &str {
        "none"
    }
}

/// Compose the form service from config.
pub fn build_service(config: &Config, offline: bool) -> FormService {
    let registry = Arc::new(SchemaRegistry::new());
    let engine = build_engine(config);
    let extractor = build_extractor(config, &registry, engine.as_ref(), offline);
    let engine_timeout = Duration::from_secs(config.engine.timeout_secs);

    let interpreter = match engine {
        Some(engine) if !offline => {
            CommandInterpreter::with_engine(Arc::clone(&registry), engine)
                .with_timeout(engine_timeout)
        }
        _ => CommandInterpreter::fallback_only(Arc::clone(&registry)),
    };

    let artifacts = FormArtifacts::new(config.server.forms_dir(), "/static/forms");
    let mut service = FormService::new(Arc::clone(&registry), extractor, interpreter, artifacts);

    let renderer = &config.renderer;
    if renderer.is_configured() {
        let timeout = Duration::from_secs(renderer.timeout_secs);
        let anvil = AnvilRenderer::new(renderer.api_key.clone())
            .with_base_url(renderer.base_url.clone())
            .with_request_timeout(timeout);
        service = service.with_renderer(RenderSettings {
            renderer: Arc::new(anvil),
            template_id: renderer.template_id.clone(),
            title: renderer.title.clone(),
            font_size: renderer.font_size,
            text_color: renderer.text_color.clone(),
            timeout,
        });
    } else {
        warn!("Anvil key or template id missing, PDFs will not be rendered");
    }

    let source = &config.memory_source;
    if source.is_configured() {
        let timeout = Duration::from_secs(source.timeout_secs);
        let retool = RetoolMemorySource::new(
            source.company_list_url.clone(),
            source.company_memory_url.clone(),
            source.list_api_key.clone(),
            source.memory_api_key.clone(),
        )
        .with_request_timeout(timeout);
        service = service.with_directory(CompanyDirectory::new(Arc::new(retool)).with_timeout(timeout));
    }

    let transcription = &config.transcription;
    if transcription.is_configured() {
        let whisper = WhisperTranscriber::new(
            transcription.api_key.clone(),
            transcription.model.clone(),
        )
        .with_base_url(transcription.base_url.clone());
        service = service.with_transcriber(Arc::new(whisper));
    }

    service
}
