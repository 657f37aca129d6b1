use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use formpilot_forms::FormService;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FormService>,
}

impl AppState {
    pub const fn new(service: Arc<FormService>) -> Self {
        Self { service }
    }
}

/// Company ids arrive as JSON strings or numbers.
fn entity_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "entity_id")]
    pub company_id: String,
    /// Fetched from the memory source when absent.
    #[serde(default)]
    pub memory_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UpdateRequest {
    Stored {
        #[serde(deserialize_with = "entity_id")]
        company_id: String,
        command: String,
    },
    Detached {
        #[serde(rename = "formData")]
        form_data: Value,
        #[serde(rename = "updateCommand")]
        update_command: String,
    },
}

pub fn build_router(state: AppState, static_dir: &FsPath, allowed_origins: &[String]) -> Router {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect::<Vec<_>>();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/companies", get(list_companies))
        .route("/companies/:company_id/memory", get(company_memory))
        .route("/forms/generate", post(generate_form))
        .route("/forms/update", post(update_form))
        .route("/forms/undo/:company_id", post(undo_form))
        .route("/forms/transcribe", post(transcribe))
        .route("/forms/:company_id", get(current_form))
        .route("/forms/:company_id/pdf", post(regenerate_pdf))
        .route("/voice/transcribe", post(transcribe))
        .with_state(state)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_companies(State(state): State<AppState>) -> Json<Value> {
    let companies = state.service.companies().await;
    Json(json!({ "companies": companies }))
}

async fn company_memory(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Json<Value> {
    let memory = state.service.company_memory(&company_id).await;
    Json(json!({ "memory": memory }))
}

async fn generate_form(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let generated = match request.memory_data {
        Some(memory) => state.service.generate(&request.company_id, &memory).await?,
        None => state.service.generate_from_source(&request.company_id).await?,
    };
    Ok(Json(json!({
        "pdf_url": generated.pdf_url,
        "formData": generated.snapshot.form(),
        "version": generated.snapshot.version(),
    })))
}

async fn update_form(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    match request {
        UpdateRequest::Stored {
            company_id,
            command,
        } => {
            let edited = state.service.update(&company_id, &command).await?;
            Ok(Json(json!({
                "updatedFormData": edited.snapshot.form(),
                "path": edited.path,
                "version": edited.snapshot.version(),
            })))
        }
        UpdateRequest::Detached {
            form_data,
            update_command,
        } => {
            let outcome = state
                .service
                .update_detached(&form_data, &update_command)
                .await?;
            Ok(Json(json!({
                "updatedFormData": outcome.form,
                "path": outcome.path,
            })))
        }
    }
}

async fn undo_form(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.service.undo(&company_id).await?;
    Ok(Json(json!({
        "updatedFormData": snapshot.form(),
        "version": snapshot.version(),
    })))
}

async fn current_form(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.service.current(&company_id)?;
    Ok(Json(json!({
        "formData": snapshot.form(),
        "version": snapshot.version(),
    })))
}

async fn regenerate_pdf(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pdf_url = state.service.regenerate_pdf(&company_id).await?;
    Ok(Json(json!({ "pdf_url": pdf_url })))
}

async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.webm").to_string();
        let audio = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        info!("Received {} bytes of audio", audio.len());

        let transcript = state.service.transcribe(audio.to_vec(), &file_name).await?;
        return Ok(Json(json!({ "transcript": transcript })));
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}
