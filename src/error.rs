// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

pub type AppResult<T> = Result<T, AppError>;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 400 Bad Request, one message per offending field
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    // 400 Bad Request
    #[error("Bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    // 409 Conflict (duplicate test name, choice minimum, full test)
    #[error("Conflict: {0}")]
    Conflict(String),

    // 503 Service Unavailable (store unreachable)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent alongside the HTTP status.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let body = match self {
            AppError::Validation(errors) => json!({
                "code": status.as_u16(),
                "error": code,
                "message": "Request validation failed",
                "errors": errors,
            }),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({
                    "code": status.as_u16(),
                    "error": code,
                    "message": "Internal Server Error",
                })
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                json!({
                    "code": status.as_u16(),
                    "error": code,
                    "message": "Service temporarily unavailable",
                })
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => json!({
                "code": status.as_u16(),
                "error": code,
                "message": msg,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Connection-level failures become `ServiceUnavailable` so callers can retry;
/// everything else is an internal error. Allows using `?` on queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        flatten_validation_errors(None, &errors, &mut messages);
        messages.sort();
        AppError::Validation(messages)
    }
}

/// Walks nested validation errors, producing `"path is code"` messages
/// (e.g. `questions[0].choices is length`).
fn flatten_validation_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    match &err.message {
                        Some(message) => out.push(format!("{}: {}", path, message)),
                        None => out.push(format!("{} is {}", path, err.code)),
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                flatten_validation_errors(Some(&path), inner, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_path = format!("{}[{}]", path, index);
                    flatten_validation_errors(Some(&item_path), inner, out);
                }
            }
        }
    }
}
