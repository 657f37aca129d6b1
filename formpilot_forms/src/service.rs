//! Orchestration of extraction, rendering, storage and edits.

use formpilot_core::{CanonicalForm, PdfRenderer, RenderRequest, SchemaRegistry, Transcriber};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::artifacts::{FormArtifacts, is_valid_entity_id};
use crate::directory::CompanyDirectory;
use crate::error::{FormError, StoreError};
use crate::extraction::FieldExtractor;
use crate::interpreter::{CommandInterpreter, EditOutcome, EditPath};
use crate::store::{FormStore, Snapshot};

/// Renderer plus the fixed parts of every render request.
#[derive(Clone)]
pub struct RenderSettings {
    pub renderer: Arc<dyn PdfRenderer>,
    pub template_id: String,
    pub title: String,
    pub font_size: u32,
    pub text_color: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeneratedForm {
    pub snapshot: Snapshot,
    /// `None` when no renderer is configured.
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditedForm {
    pub snapshot: Snapshot,
    pub path: EditPath,
}

pub struct FormService {
    registry: Arc<SchemaRegistry>,
    extractor: Arc<dyn FieldExtractor>,
    interpreter: CommandInterpreter,
    store: FormStore,
    artifacts: FormArtifacts,
    directory: CompanyDirectory,
    render: Option<RenderSettings>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl FormService {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        extractor: Arc<dyn FieldExtractor>,
        interpreter: CommandInterpreter,
        artifacts: FormArtifacts,
    ) -> Self {
        Self {
            registry,
            extractor,
            interpreter,
            store: FormStore::new(),
            artifacts,
            directory: CompanyDirectory::empty(),
            render: None,
            transcriber: None,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, settings: RenderSettings) -> Self {
        self.render = Some(settings);
        self
    }

    #[must_use]
    pub fn with_directory(mut self, directory: CompanyDirectory) -> Self {
        self.directory = directory;
        self
    }

    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn store(&self) -> &FormStore {
        &self.store
    }

    #[must_use]
    pub const fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }

    fn check_id(entity_id: &str) -> Result<(), FormError> {
        if is_valid_entity_id(entity_id) {
            Ok(())
        } else {
            Err(FormError::InvalidEntityId(entity_id.to_string()))
        }
    }

    /// Extract a form without storing or rendering it.
    pub async fn extract_form(&self, memory: &Value) -> Result<CanonicalForm, FormError> {
        Ok(self.extractor.extract_all(memory).await?)
    }

    /// Extract a form from raw memory, render it and make it current.
    ///
    /// The store is only written after extraction, rendering and the PDF
    /// write have all succeeded.
    pub async fn generate(&self, entity_id: &str, memory: &Value) -> Result<GeneratedForm, FormError> {
        Self::check_id(entity_id)?;
        info!("Generating form for company {entity_id}");

        let form = self.extractor.extract_all(memory).await?;

        let mut guard = self.store.lock_or_create(entity_id).await;
        let pdf_url = self.render_and_write(entity_id, &form).await?;
        let snapshot = guard.generate(form);

        Ok(GeneratedForm { snapshot, pdf_url })
    }

    /// Generate from the company's memory as held by the memory source.
    ///
    /// A failed lookup fails the generation and leaves any existing form and
    /// its history in place.
    pub async fn generate_from_source(&self, entity_id: &str) -> Result<GeneratedForm, FormError> {
        Self::check_id(entity_id)?;
        let memory = self.directory.fetch_memory(entity_id).await?;
        self.generate(entity_id, &memory).await
    }

    /// Apply a command to the company's current form.
    pub async fn update(&self, entity_id: &str, command: &str) -> Result<EditedForm, FormError> {
        Self::check_id(entity_id)?;
        let Some(mut guard) = self.store.lock(entity_id).await else {
            return Err(StoreError::NoCurrentState(entity_id.to_string()).into());
        };
        let current = guard.current()?;

        let outcome = self.interpreter.apply_command(current.form(), command).await;
        let snapshot = guard.apply_edit(outcome.form)?;

        info!(
            "Updated form for company {entity_id} via {} path",
            outcome.path.as_str()
        );
        Ok(EditedForm {
            snapshot,
            path: outcome.path,
        })
    }

    /// Apply a command to a caller-supplied form without touching the store.
    pub async fn update_detached(
        &self,
        form_data: &Value,
        command: &str,
    ) -> Result<EditOutcome, FormError> {
        let form = CanonicalForm::from_json(form_data, &self.registry)?;
        Ok(self.interpreter.apply_command(&form, command).await)
    }

    pub async fn undo(&self, entity_id: &str) -> Result<Snapshot, FormError> {
        Self::check_id(entity_id)?;
        Ok(self.store.undo(entity_id).await?)
    }

    pub fn current(&self, entity_id: &str) -> Result<Snapshot, FormError> {
        Ok(self.store.get_current(entity_id)?)
    }

    /// Render the current form again, e.g. after edits.
    pub async fn regenerate_pdf(&self, entity_id: &str) -> Result<Option<String>, FormError> {
        Self::check_id(entity_id)?;
        let Some(guard) = self.store.lock(entity_id).await else {
            return Err(StoreError::NoCurrentState(entity_id.to_string()).into());
        };
        let current = guard.current()?;
        self.render_and_write(entity_id, current.form()).await
    }

    async fn render_and_write(
        &self,
        entity_id: &str,
        form: &CanonicalForm,
    ) -> Result<Option<String>, FormError> {
        let Some(settings) = &self.render else {
            warn!("No PDF renderer configured, skipping render for company {entity_id}");
            return Ok(None);
        };

        let request = RenderRequest {
            title: settings.title.clone(),
            font_size: settings.font_size,
            text_color: settings.text_color.clone(),
            data: form.with_display_defaults(&self.registry),
        };

        let pdf = match tokio::time::timeout(
            settings.timeout,
            settings.renderer.render(&settings.template_id, &request),
        )
        .await
        {
            Ok(Ok(pdf)) => pdf,
            Ok(Err(e)) => return Err(FormError::upstream("PDF rendering failed", &e)),
            Err(_) => {
                return Err(FormError::Upstream(format!(
                    "PDF rendering timed out after {}s",
                    settings.timeout.as_secs()
                )));
            }
        };

        let url = self.artifacts.write(entity_id, &pdf).await?;
        Ok(Some(url))
    }

    pub async fn companies(&self) -> Vec<Value> {
        self.directory.list_companies().await
    }

    pub async fn company_memory(&self, entity_id: &str) -> Value {
        self.directory.company_memory(entity_id).await
    }

    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String, FormError> {
        let Some(transcriber) = &self.transcriber else {
            return Err(FormError::Upstream(
                "no transcription service configured".to_string(),
            ));
        };
        transcriber
            .transcribe(audio, file_name)
            .await
            .map_err(|e| FormError::upstream("transcription failed", &e))
    }
}
