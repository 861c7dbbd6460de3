//! Read-only directory and dashboard handlers: devices, technicians,
//! stores, units, and the summary counts.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use time::{Duration, OffsetDateTime};

use coldwatch_auth::Principal;
use coldwatch_core::{DeviceId, DeviceStatus, Error, StoreId};
use coldwatch_storage::TelemetryStore;

use super::error::ApiError;
use super::payload::{
    parse_query_enum, parse_query_timestamp, AlertListQuery, ApiEnvelope, DashboardResponse,
    DeviceDetailResponse, DeviceListQuery, DeviceResponse, ReadingResponse, StoreListQuery,
    StoreResponse, TechnicianListQuery, TechnicianResponse, TelemetryHistoryQuery, UnitResponse,
};
use super::state::AppState;

/// GET /devices
pub(crate) async fn handle_list_devices(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<DeviceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let status = parse_query_enum::<DeviceStatus>("status", &query.status)?;
    let devices = state
        .store
        .list_devices(
            query.store_id.map(StoreId),
            status,
            query.limit.unwrap_or(0),
        )
        .await
        .map_err(Error::from)?;
    let payload: Vec<DeviceResponse> = devices.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /devices/{id}
pub(crate) async fn handle_get_device(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let device = state.store.device(DeviceId(id)).await.map_err(Error::from)?;
    let latest = state
        .store
        .latest_reading(device.id)
        .await
        .map_err(Error::from)?;
    let payload = DeviceDetailResponse {
        device: device.into(),
        latest_reading: latest.map(Into::into),
    };
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /devices/{id}/telemetry
pub(crate) async fn handle_device_telemetry(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Query(query): Query<TelemetryHistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let from = parse_query_timestamp("from", &query.from)?;
    let to = parse_query_timestamp("to", &query.to)?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError(Error::BadRequest(
                "'from' must not be after 'to'".to_string(),
            )));
        }
    }
    // Confirm the device exists so an unknown id is 404, not an empty list.
    let device = state.store.device(DeviceId(id)).await.map_err(Error::from)?;
    let readings = state
        .store
        .list_readings(device.id, from, to, query.limit.unwrap_or(0))
        .await
        .map_err(Error::from)?;
    let payload: Vec<ReadingResponse> = readings.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /technicians
pub(crate) async fn handle_list_technicians(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TechnicianListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let technicians = state
        .store
        .list_technicians(query.region.as_deref(), query.limit.unwrap_or(0))
        .await
        .map_err(Error::from)?;
    let payload: Vec<TechnicianResponse> = technicians.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /stores
pub(crate) async fn handle_list_stores(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StoreListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let stores = state
        .store
        .list_stores(query.limit.unwrap_or(0))
        .await
        .map_err(Error::from)?;
    let payload: Vec<StoreResponse> = stores.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /stores/{id}
pub(crate) async fn handle_get_store(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let store = state.store.store(StoreId(id)).await.map_err(Error::from)?;
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok(StoreResponse::from(store))),
    ))
}

/// GET /stores/{id}/units
pub(crate) async fn handle_store_units(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    // 404 for an unknown store rather than an empty unit list.
    let store = state.store.store(StoreId(id)).await.map_err(Error::from)?;
    let units = state
        .store
        .units_for_store(store.id)
        .await
        .map_err(Error::from)?;
    let payload: Vec<UnitResponse> = units.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /dashboard/summary
pub(crate) async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let as_of = OffsetDateTime::now_utc();
    let counts = state.store.dashboard_counts().await.map_err(Error::from)?;
    let alerts_last_hour = state
        .store
        .count_alerts_since(as_of - Duration::hours(1))
        .await
        .map_err(Error::from)?;
    let payload = DashboardResponse::new(counts, alerts_last_hour, as_of);
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}

/// GET /dashboard/alerts
///
/// Devices currently in an alerting condition: status FAULT, or the most
/// recent reading was out of band. Each entry carries its latest reading.
pub(crate) async fn handle_dashboard_alerts(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AlertListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require_human()?;
    let devices = state
        .store
        .alert_devices(query.limit.unwrap_or(0))
        .await
        .map_err(Error::from)?;
    let mut payload = Vec::with_capacity(devices.len());
    for device in devices {
        let latest = state
            .store
            .latest_reading(device.id)
            .await
            .map_err(Error::from)?;
        payload.push(DeviceDetailResponse {
            device: device.into(),
            latest_reading: latest.map(Into::into),
        });
    }
    Ok((StatusCode::OK, Json(ApiEnvelope::ok(payload))))
}
