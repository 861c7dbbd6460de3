//! Closed error taxonomy for all coldwatch operations.
//!
//! Every business-rule violation anywhere in the system surfaces as one of
//! these variants. The API layer maps each variant to a transport status
//! with an exhaustive match, so no failure can fall through to an
//! undifferentiated internal error.

use std::collections::BTreeMap;

/// The error type returned by every fallible coldwatch operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A referenced device, incident, technician, store, or user is unknown.
    #[error("{0}")]
    NotFound(String),

    /// The operation conflicts with existing state, e.g. a manual incident
    /// create while an OPEN incident already exists for the device.
    #[error("{0}")]
    Conflict(String),

    /// The request is structurally valid but semantically rejected, e.g. a
    /// status transition out of RESOLVED or an inverted date range.
    #[error("{0}")]
    BadRequest(String),

    /// Per-field validation failures on a request body.
    #[error("request validation failed")]
    Validation(BTreeMap<String, String>),

    /// Ingestion admission denied by the per-device rate limiter.
    #[error("rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Missing, malformed, expired, or otherwise invalid credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the principal lacks the required capability.
    #[error("{0}")]
    Forbidden(String),

    /// Unexpected failure (storage backend, serialization, task join).
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code used in the API response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::BadRequest(_) => "VALIDATION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::RateLimited { .. } => "RATE_LIMITED",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(Error::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(Error::BadRequest("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(
            Error::RateLimited { retry_after: 30 }.code(),
            "RATE_LIMITED"
        );
        assert_eq!(Error::Unauthorized("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(Error::Forbidden("x".into()).code(), "FORBIDDEN");
        assert_eq!(Error::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn validation_carries_field_map() {
        let mut fields = BTreeMap::new();
        fields.insert("temperature".to_string(), "must be finite".to_string());
        let err = Error::Validation(fields.clone());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        match err {
            Error::Validation(map) => assert_eq!(map, fields),
            _ => unreachable!(),
        }
    }
}
