// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{TimeDelta, Utc};

use crate::{
    error::AppError,
    extractors::ValidJson,
    models::user::{LoginRequest, ROLE_USER, RegisterRequest, TokenResponse, User},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new participant account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hashed_password = hash_password(&payload.password)?;
    let user = User::new(&payload.name, &payload.email, hashed_password, ROLE_USER);

    let user = state.store.create_user(user).await?;
    tracing::info!("User registered: {} ({})", user.email, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user by email and password and returns a JWT.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::warn!("Failed login for {}", user.email);
        return Err(invalid_credentials());
    }

    Ok(Json(issue_token(&state, &user)?))
}

/// Re-issues a token for the caller, re-reading name and role from the store.
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(issue_token(&state, &user)?))
}

fn issue_token(state: &AppState, user: &User) -> Result<TokenResponse, AppError> {
    let expiration = state.config.jwt_expiration;
    let token = sign_jwt(
        user.id,
        &user.name,
        &user.role,
        &state.config.jwt_secret,
        expiration,
    )?;

    Ok(TokenResponse {
        token,
        token_type: "Bearer",
        expire: Utc::now() + TimeDelta::seconds(expiration as i64),
    })
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}
