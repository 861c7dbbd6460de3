//! Mapping from the domain error taxonomy to HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use coldwatch_core::Error;

use super::payload::ApiEnvelope;

/// Transport wrapper so domain errors can be returned with `?` from
/// handlers.
#[derive(Debug)]
pub(crate) struct ApiError(pub(crate) Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Exhaustive on purpose: a new error kind must pick its status here.
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let envelope = match &self.0 {
            Error::Validation(fields) => ApiEnvelope::field_errors(self.0.code(), fields),
            other => ApiEnvelope::error(other.code(), other.to_string()),
        };
        let mut response = (status, Json(envelope)).into_response();
        if let Error::RateLimited { retry_after } = &self.0 {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
