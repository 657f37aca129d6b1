use formpilot_core::FormShapeError;
use thiserror::Error;

/// Why an extraction produced no form. Never replaced by defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("reasoning engine error: {0}")]
    EngineError(String),

    #[error("reasoning engine timed out after {0}s")]
    EngineTimeout(u64),

    #[error("malformed engine output: {0}")]
    MalformedOutput(String),

    #[error("engine output is missing requested key: {key}")]
    Incomplete { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no form has been generated for company {0}")]
    NoCurrentState(String),

    #[error("no older version of the form for company {0}")]
    EmptyHistory(String),

    #[error("no form found for company {0}")]
    NotFound(String),
}

/// Errors surfaced by [`crate::FormService`].
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid form data: {0}")]
    InvalidForm(#[from] FormShapeError),

    #[error("invalid company id: {0:?}")]
    InvalidEntityId(String),

    #[error("upstream service unavailable: {0}")]
    Upstream(String),

    #[error("failed to write form artifact: {0}")]
    Artifact(#[from] std::io::Error),
}

impl FormError {
    pub(crate) fn upstream(context: &str, err: &anyhow::Error) -> Self {
        Self::Upstream(format!("{context}: {err:#}"))
    }
}
