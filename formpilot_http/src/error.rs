use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use formpilot_forms::{ExtractionFailure, FormError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::Form(
                FormError::InvalidForm(_)
                | FormError::InvalidEntityId(_)
                | FormError::Store(StoreError::NoCurrentState(_) | StoreError::EmptyHistory(_)),
            ) => StatusCode::BAD_REQUEST,
            Self::Form(FormError::Store(StoreError::NotFound(_))) => StatusCode::NOT_FOUND,
            Self::Form(FormError::Extraction(ExtractionFailure::EngineTimeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Form(FormError::Extraction(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Form(FormError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            Self::Form(FormError::Artifact(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            warn!("Request rejected: {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
