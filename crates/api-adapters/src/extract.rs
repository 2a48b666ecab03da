//! Request extractors.

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// A form-or-JSON extractor that validates what it deserializes.
///
/// `application/json` bodies go through `Json`; everything else through
/// `Form`, which reads the query string for `GET` requests and the
/// url-encoded body otherwise. Validation failures become a 400 with
/// field-level details.
///
/// # Example
///
/// ```ignore
/// async fn report_thread(
///     ValidatedInput(form): ValidatedInput<ThreadRef>,
/// ) -> Result<&'static str, ApiError> {
///     // form is already validated
/// }
/// ```
pub struct ValidatedInput<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedInput<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let value = if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;
            value
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid form: {}", e.body_text())))?;
            value
        };

        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(ValidatedInput(value))
    }
}
