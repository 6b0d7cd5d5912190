//! Request extractors that reject with the uniform error body

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use catalog_common::errors::AppError;
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that is deserialized and then validated.
///
/// Malformed JSON, a wrong content type and failed field constraints all
/// surface as `AppError::Validation` (400).
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation {
                message: rejection.body_text(),
                field: None,
            })?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters; a segment that does not parse is a 400 with the
/// uniform body instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation {
                message: rejection.body_text(),
                field: None,
            })?;

        Ok(Self(value))
    }
}
