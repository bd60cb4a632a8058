// src/utils/jwt.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{ROLE_ADMIN, ROLE_USER},
    state::AppState,
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the user's immutable id.
    pub sub: String,
    /// Display name, echoed back in results.
    pub name: String,
    /// User's role ('user' or 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: Uuid,
    name: &str,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> AppResult<String> {
    let expiration = Utc::now().timestamp().max(0) as usize + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        name: name.to_owned(),
        role: role.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// decoded `Claims` into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(AppError::Unauthorized("Missing bearer token".to_string())),
    };

    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    // reject malformed subjects before any handler sees them
    claims.user_id()?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(&req, ROLE_ADMIN)?;
    Ok(next.run(req).await)
}

/// Axum Middleware: Participant Authorization.
///
/// Only plain users take tests; admins author them. Must be used AFTER `auth_middleware`.
pub async fn participant_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(&req, ROLE_USER)?;
    Ok(next.run(req).await)
}

fn require_role(req: &Request<Body>, role: &str) -> AppResult<()> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::Unauthorized("Missing credentials".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden("you cannot have access".to_string()));
    }

    Ok(())
}
