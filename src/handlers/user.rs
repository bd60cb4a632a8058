// src/handlers/user.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    extractors::ValidJson,
    models::{answer::SubmitAnswersRequest, attempt::StartAttemptRequest},
    state::AppState,
    utils::jwt::Claims,
};

/// Starts (or resumes) the caller's attempt on a test.
pub async fn attempt_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(payload): ValidJson<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = state
        .attempts
        .start(claims.user_id()?, payload.test_id)
        .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Scores a batch of answers and finishes the open attempt.
pub async fn answer_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(payload): ValidJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state
        .submissions
        .submit(claims.user_id()?, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Latest result of the caller on a test.
pub async fn result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .results
        .get_result(claims.user_id()?, &claims.name, test_id)
        .await?;

    Ok(Json(result))
}
