// src/extractors.rs

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that is deserialized and then validated.
///
/// Malformed bodies and failed `validator` rules both come back as a
/// 400 `AppError::Validation` in the usual error envelope.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::warn!("Rejected JSON body: {}", rejection.body_text());
            AppError::Validation(vec![rejection.body_text()])
        })?;

        value.validate()?;
        Ok(ValidJson(value))
    }
}
