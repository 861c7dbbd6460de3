//! Authentication middleware.
//!
//! Establishes a [`Principal`] for every protected request and stores it in
//! the request extensions. Two mechanisms, in order:
//!
//! 1. `Authorization: Bearer <access token>`: a presented bearer token is
//!    authoritative; if it fails validation the request is rejected rather
//!    than falling through to the device key.
//! 2. `X-Device-Key: <key>`: consulted only when no bearer token was
//!    presented; resolves to a device principal.
//!
//! `/health` and the `/auth/*` endpoints are exempt.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use coldwatch_auth::{Principal, TokenKind};
use coldwatch_core::Error;
use coldwatch_workflow::resolve_device_key;

use super::error::ApiError;
use super::state::AppState;

pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if path == "/health" || path.starts_with("/auth/") {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);
    if let Some(token) = bearer {
        return match state.tokens.validate(&token, TokenKind::Access) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(Principal::user(&claims.sub, claims.role));
                next.run(request).await
            }
            Err(err) => {
                debug!(path = %request.uri().path(), error = %err, "bearer token rejected");
                ApiError(Error::Unauthorized(err.to_string())).into_response()
            }
        };
    }

    let device_key = request
        .headers()
        .get("x-device-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if let Some(key) = device_key {
        return match resolve_device_key(state.store.as_ref(), &key).await {
            Ok(Some((_, principal))) => {
                request.extensions_mut().insert(principal);
                next.run(request).await
            }
            Ok(None) => {
                debug!(path = %request.uri().path(), "unknown device key presented");
                ApiError(Error::Unauthorized("unknown device key".to_string())).into_response()
            }
            Err(err) => ApiError(err).into_response(),
        };
    }

    ApiError(Error::Unauthorized("authentication required".to_string())).into_response()
}
