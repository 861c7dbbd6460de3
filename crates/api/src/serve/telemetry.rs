//! POST /telemetry: the device-facing ingestion endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use coldwatch_auth::Principal;

use super::error::ApiError;
use super::payload::{ApiEnvelope, ApiJson, ReadingResponse, TelemetryRequest};
use super::state::AppState;

pub(crate) async fn handle_ingest(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    ApiJson(body): ApiJson<TelemetryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.validate()?;
    let outcome = state.pipeline.ingest(&principal, request).await?;

    let message = if outcome.opened_incident.is_some() {
        "temperature threshold exceeded, incident created"
    } else if outcome.reading.is_alert {
        "temperature threshold exceeded, incident already open"
    } else {
        "telemetry recorded"
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(
            ReadingResponse::from(outcome.reading),
            message,
        )),
    ))
}
