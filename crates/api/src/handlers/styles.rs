//! Handler for the curated style presets.
//!
//! Styles are an opaque JSON document maintained alongside the model
//! presets; the server serves it verbatim rather than modelling its
//! schema, so style curation never requires a redeploy.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// `GET /styles` — the styles file, byte for byte.
pub async fn get_styles(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let path = &state.config.styles_path;
    let body = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!(path = %path, error = %e, "Failed to read styles file");
        AppError::Internal(format!("read styles {path}: {e}"))
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
