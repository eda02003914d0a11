//! HTTP boundary over the upload/ask pipeline.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pdfqa_core::error::Error;
use pdfqa_rag::Pipeline;

/// Multipart field carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let body_limit = pipeline.settings().server.max_upload_bytes;
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/health", get(health))
        .route("/documents", get(documents))
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// `{"detail": ...}` error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<Value>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn status(&self) -> StatusCode { self.status }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            Error::DocumentNotFound { id, available } => Self::new(
                StatusCode::NOT_FOUND,
                json!({ "message": format!("No index found for '{id}'. Upload the PDF first."), "available": available }),
            ),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn documents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let documents = state.pipeline.documents().await?;
    Ok(Json(json!({ "documents": documents })))
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::new(e.status(), e.body_text()))? {
        if field.name() != Some(UPLOAD_FIELD) { continue; }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }
    let Some((filename, bytes)) = upload else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, format!("missing multipart field '{UPLOAD_FIELD}'")));
    };

    let report = state.pipeline.index_upload(&filename, bytes.to_vec()).await.map_err(|e| {
        tracing::error!(filename = %filename, error = %e, "upload failed");
        ApiError::from(e)
    })?;
    Ok(Json(json!({
        "message": format!("Indexed {} chunks from {}", report.chunks, report.filename),
        "id": report.id,
        "filename": report.filename,
        "chunks": report.chunks,
        "semantic": report.semantic,
        "mirrored": report.mirrored,
        "local_copy": report.local_copy.display().to_string(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub question: String,
}

async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Result<Json<Value>, ApiError> {
    let outcome = state.pipeline.ask(&req.filename, &req.question).await.map_err(|failure| {
        tracing::debug!(states = ?failure.trace.states(), "query failed");
        ApiError::from(failure.error)
    })?;
    Ok(Json(json!({
        "answer": outcome.answer,
        "source": pdfqa_core::sanitize::sanitize(&req.filename),
        "retrieval": outcome.retrieval_path.label(),
    })))
}
