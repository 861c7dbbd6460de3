//! Incident route handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use coldwatch_auth::Principal;
use coldwatch_core::{DeviceId, IncidentId, IncidentStatus, TechnicianId};

use super::error::ApiError;
use super::payload::{
    parse_query_enum, ApiEnvelope, ApiJson, AssignRequest, CreateIncidentRequest,
    IncidentDetailResponse, IncidentListQuery, IncidentResponse, UpdateStatusRequest,
};
use super::state::AppState;

/// GET /incidents
pub(crate) async fn handle_list(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<IncidentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_query_enum::<IncidentStatus>("status", &query.status)?;
    let incidents = state
        .incidents
        .list(
            &principal,
            status,
            query.device_id.map(DeviceId),
            query.limit.unwrap_or(0),
        )
        .await?;
    let payload: Vec<IncidentResponse> = incidents.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// POST /incidents
pub(crate) async fn handle_create(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    ApiJson(body): ApiJson<CreateIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.validate()?;
    let incident = state.incidents.create(&principal, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(
            IncidentResponse::from(incident),
            "incident created",
        )),
    ))
}

/// GET /incidents/{id}
pub(crate) async fn handle_get(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let (incident, assignments) = state.incidents.get(&principal, IncidentId(id)).await?;
    let payload = IncidentDetailResponse {
        incident: incident.into(),
        assignments: assignments.into_iter().map(Into::into).collect(),
    };
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// PUT /incidents/{id}/status
pub(crate) async fn handle_set_status(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let to = body.validate()?;
    let incident = state
        .incidents
        .set_status(&principal, IncidentId(id), to)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok_with_message(
            IncidentResponse::from(incident),
            "incident status updated",
        )),
    ))
}

/// POST /incidents/{id}/assign
pub(crate) async fn handle_assign(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (incident, assignments) = {
        let (incident, _assignment) = state
            .incidents
            .assign_technician(
                &principal,
                IncidentId(id),
                TechnicianId(body.technician_id),
                body.notes,
            )
            .await?;
        let (_, assignments) = state.incidents.get(&principal, incident.id).await?;
        (incident, assignments)
    };
    let payload = IncidentDetailResponse {
        incident: incident.into(),
        assignments: assignments.into_iter().map(Into::into).collect(),
    };
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok_with_message(payload, "technician assigned")),
    ))
}
