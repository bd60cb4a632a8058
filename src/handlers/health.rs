// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Liveness plus a round trip to the store.
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.store.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
