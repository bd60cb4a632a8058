// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    extractors::ValidJson,
    models::{
        question::{
            CreateChoiceRequest, CreateQuestionsRequest, DeleteChoiceRequest,
            DeleteQuestionRequest, UpdateChoiceRequest, UpdateQuestionRequest,
        },
        test::{CreateTestRequest, DeleteTestRequest, UpdateTestRequest},
    },
    state::AppState,
};

/// Lists all tests with their count.
/// Admin only.
pub async fn list_tests(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.list_tests().await?))
}

/// A test with questions, choices and canonical answers.
/// Admin only.
pub async fn test_detail(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.test_detail(test_id).await?))
}

pub async fn create_test(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let test = state.catalog.create_test(payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

/// Adds a batch of questions, reporting created ids and the dropped count.
pub async fn create_question(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let batch = state.catalog.create_questions(payload).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn create_choice(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let choice = state.catalog.add_choice(payload).await?;
    Ok((StatusCode::CREATED, Json(choice)))
}

pub async fn update_test(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<UpdateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.update_test(payload).await?))
}

pub async fn update_question(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.update_question(payload).await?))
}

pub async fn update_choice(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<UpdateChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.update_choice(payload).await?))
}

/// Deletes a test with everything hanging off it.
pub async fn delete_test(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<DeleteTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_test(payload.test_id).await?;
    Ok(Json(json!({ "message": "success delete test" })))
}

pub async fn delete_question(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<DeleteQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_question(payload.question_id).await?;
    Ok(Json(json!({ "message": "success delete question" })))
}

pub async fn delete_choice(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<DeleteChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_choice(payload).await?;
    Ok(Json(json!({ "message": "success delete choice" })))
}
