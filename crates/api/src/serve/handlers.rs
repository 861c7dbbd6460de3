//! Public route handlers: health, login, refresh, and the fallback.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use coldwatch_core::Error;

use super::error::ApiError;
use super::payload::{ApiEnvelope, ApiJson, LoginRequest, RefreshRequest, TokenResponse};
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    ApiError(Error::NotFound("no such endpoint".to_string()))
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "service": "coldwatch",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(ApiEnvelope::ok(body)))
}

/// POST /auth/login
pub(crate) async fn handle_login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    let pair = state.sessions.login(&body.email, &body.password).await?;
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok_with_message(
            TokenResponse::from(pair),
            "login successful",
        )),
    ))
}

/// POST /auth/refresh
pub(crate) async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.sessions.refresh(&body.refresh_token).await?;
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok_with_message(
            TokenResponse::from(pair),
            "token refreshed",
        )),
    ))
}
