//! Validated JSON extractors - Deserialization plus `validator` checks.
//!
//! Rejections become [`AppError::Validation`], so malformed bodies get the
//! same envelope as every other error.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// JSON body validated before the handler runs.
///
/// ```rust,ignore
/// async fn create_user(ValidatedJson(payload): ValidatedJson<CreateUser>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// JSON array body whose every element is validated.
pub struct ValidatedJsonList<T>(pub Vec<T>);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJsonList<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<Vec<T>>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(values) = Json::<Vec<T>>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        for (index, value) in values.iter().enumerate() {
            value.validate().map_err(|e| {
                AppError::validation(format!("[{}] {}", index, format_validation_errors(&e)))
            })?;
        }

        Ok(ValidatedJsonList(values))
    }
}

/// Format validation errors into a user-friendly string
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>();
    // Field order in the map is unspecified
    messages.sort();
    messages.join(", ")
}
