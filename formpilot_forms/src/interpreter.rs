//! Free-text edits to a canonical form.
//!
//! The reasoning strategy asks the engine for the whole edited form and
//! validates it against the registry. Any failure there drops to the
//! fallback strategy, which only knows the deductible command.

use formpilot_core::{
    CanonicalForm, DEDUCTIBLE_FIELD, LLMProvider, SchemaRegistry, strip_code_fences,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ExtractionFailure;

/// Value written by the fallback for deductible commands.
pub const DEDUCTIBLE_PLACEHOLDER: &str = "$5000";

const EDIT_SYSTEM_PROMPT: &str = "You update insurance application form data from user \
instructions. You only return valid JSON containing every key of the input form.";

/// Which strategy produced an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditPath {
    Reasoning,
    Fallback,
}

impl EditPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub form: CanonicalForm,
    pub path: EditPath,
}

/// How commands are applied.
#[derive(Clone)]
pub enum EditStrategy {
    /// Engine first, fallback on any failure.
    Reasoning(Arc<dyn LLMProvider>),
    /// Keyword rules only.
    Fallback,
}

pub struct CommandInterpreter {
    registry: Arc<SchemaRegistry>,
    strategy: EditStrategy,
    timeout: Duration,
}

impl CommandInterpreter {
    /// Interpreter that never calls an engine.
    pub const fn fallback_only(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            strategy: EditStrategy::Fallback,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_engine(registry: Arc<SchemaRegistry>, engine: Arc<dyn LLMProvider>) -> Self {
        Self {
            registry,
            strategy: EditStrategy::Reasoning(engine),
            timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn strategy(&self) -> &EditStrategy {
        &self.strategy
    }

    /// Apply `command` to `form`. Never fails: engine problems are absorbed
    /// by the fallback, and a command that names no field leaves the form
    /// unchanged.
    pub async fn apply_command(&self, form: &CanonicalForm, command: &str) -> EditOutcome {
        match &self.strategy {
            EditStrategy::Reasoning(engine) => {
                match self.reasoning_edit(engine.as_ref(), form, command).await {
                    Ok(edited) => {
                        info!("Applied edit command with the reasoning engine");
                        EditOutcome {
                            form: edited,
                            path: EditPath::Reasoning,
                        }
                    }
                    Err(e) => {
                        warn!("Reasoning edit failed, using fallback: {e}");
                        self.fallback(form, command)
                    }
                }
            }
            EditStrategy::Fallback => self.fallback(form, command),
        }
    }

    fn fallback(&self, form: &CanonicalForm, command: &str) -> EditOutcome {
        EditOutcome {
            form: fallback_edit(&self.registry, form, command),
            path: EditPath::Fallback,
        }
    }

    /// Ask the engine for the edited form and validate it.
    pub async fn reasoning_edit(
        &self,
        engine: &dyn LLMProvider,
        form: &CanonicalForm,
        command: &str,
    ) -> Result<CanonicalForm, ExtractionFailure> {
        let prompt = build_edit_prompt(&self.registry, form, command);
        debug!("Edit prompt is {} bytes", prompt.len());

        let reply = match tokio::time::timeout(
            self.timeout,
            engine.complete(EDIT_SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(ExtractionFailure::EngineError(format!("{e:#}"))),
            Err(_) => return Err(ExtractionFailure::EngineTimeout(self.timeout.as_secs())),
        };

        let parsed: Value = serde_json::from_str(strip_code_fences(&reply))
            .map_err(|e| ExtractionFailure::MalformedOutput(format!("not valid JSON: {e}")))?;

        CanonicalForm::from_json(&parsed, &self.registry)
            .map_err(|e| ExtractionFailure::MalformedOutput(e.to_string()))
    }
}

/// Keyword edit: a command mentioning the deductible sets it to
/// [`DEDUCTIBLE_PLACEHOLDER`]; anything else returns the form unchanged.
#[must_use]
pub fn fallback_edit(registry: &SchemaRegistry, form: &CanonicalForm, command: &str) -> CanonicalForm {
    let mut edited = form.clone();
    if command.to_lowercase().contains(DEDUCTIBLE_FIELD) {
        if let Err(e) = edited.set(
            registry,
            DEDUCTIBLE_FIELD,
            &Value::String(DEDUCTIBLE_PLACEHOLDER.to_string()),
        ) {
            warn!("Fallback edit could not set the deductible: {e}");
        }
    } else {
        debug!("Fallback edit found no field in command");
    }
    edited
}

fn build_edit_prompt(registry: &SchemaRegistry, form: &CanonicalForm, command: &str) -> String {
    let current = serde_json::to_string_pretty(form).unwrap_or_default();
    let mut fields = String::new();
    for key in registry.dotted_keys() {
        let _ = writeln!(fields, "- {key}");
    }

    format!(
        "Here is the current form data:\n\
         ```json\n\
         {current}\n\
         ```\n\
         \n\
         Apply this instruction: {command}\n\
         \n\
         Valid field names:\n\
         {fields}\n\
         Rules:\n\
         - Return ONLY the complete JSON object, with every key of the current form\n\
         - Change only the fields the instruction refers to\n\
         - Keep nested objects nested, with the same child keys\n\
         - If the instruction refers to no field, return the form unchanged\n"
    )
}
