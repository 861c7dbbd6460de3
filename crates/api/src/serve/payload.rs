//! Wire payloads: the response envelope, request bodies with per-field
//! validation, and response DTOs.
//!
//! Request bodies deserialize loosely (enums and timestamps arrive as
//! strings) and are validated into domain types explicitly, so a bad field
//! produces the envelope's per-field error map instead of a bare
//! deserializer rejection. Response DTOs are separate from the domain
//! structs; notably, a device's credential key never appears in a response.

use std::collections::BTreeMap;

use axum::extract::{FromRequest, Request};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use coldwatch_auth::TokenPair;
use coldwatch_core::{
    Assignment, AssignmentId, Device, DeviceId, DeviceStatus, Error, Incident, IncidentId,
    IncidentStatus, IncidentType, Reading, ReadingId, Store, StoreId, Technician, TechnicianId,
    UnitId, UnitType,
};
use coldwatch_storage::DashboardCounts;
use coldwatch_workflow::{CreateIncident, IngestRequest};

use super::error::ApiError;

/// `axum::Json` with its rejection routed through the response envelope.
/// A syntactically malformed body (or a wrong content type) comes back as a
/// 400 with `error_code` set, the same shape as every other failure.
pub(crate) struct ApiJson<T>(pub(crate) T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(body)) => Ok(Self(body)),
            Err(rejection) => Err(ApiError(Error::BadRequest(rejection.body_text()))),
        }
    }
}

// ── Envelope ─────────────────────────────────────────────────────────────────

/// The envelope wrapped around every response body.
#[derive(Debug, Serialize)]
pub(crate) struct ApiEnvelope<T> {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_code: Option<&'static str>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) timestamp: OffsetDateTime,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub(crate) fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl ApiEnvelope<serde_json::Value> {
    pub(crate) fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error_code: Some(code),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Error envelope carrying a per-field validation map as its data.
    pub(crate) fn field_errors(code: &'static str, fields: &BTreeMap<String, String>) -> Self {
        Self {
            data: serde_json::to_value(fields).ok(),
            ..Self::error(code, "request validation failed")
        }
    }
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let mut fields = BTreeMap::new();
        if self.email.trim().is_empty() {
            fields.insert("email".to_string(), "must not be empty".to_string());
        }
        if self.password.is_empty() {
            fields.insert("password".to_string(), "must not be empty".to_string());
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(fields))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    pub(crate) refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelemetryRequest {
    pub(crate) device_id: i64,
    pub(crate) temperature: f64,
    /// RFC 3339; defaults to server receipt time when absent.
    pub(crate) recorded_at: Option<String>,
}

impl TelemetryRequest {
    pub(crate) fn validate(self) -> Result<IngestRequest, Error> {
        let mut fields = BTreeMap::new();
        if !self.temperature.is_finite() {
            fields.insert(
                "temperature".to_string(),
                "must be a finite number".to_string(),
            );
        }
        let recorded_at = match &self.recorded_at {
            Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
                Ok(t) => t,
                Err(_) => {
                    fields.insert(
                        "recorded_at".to_string(),
                        "must be an RFC 3339 timestamp".to_string(),
                    );
                    OffsetDateTime::now_utc()
                }
            },
            None => OffsetDateTime::now_utc(),
        };
        if !fields.is_empty() {
            return Err(Error::Validation(fields));
        }
        Ok(IngestRequest {
            device_id: DeviceId(self.device_id),
            temperature: self.temperature,
            recorded_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateIncidentRequest {
    pub(crate) device_id: i64,
    pub(crate) incident_type: String,
    pub(crate) description: String,
}

impl CreateIncidentRequest {
    pub(crate) fn validate(self) -> Result<CreateIncident, Error> {
        let mut fields = BTreeMap::new();
        let incident_type = match self.incident_type.parse::<IncidentType>() {
            Ok(t) => Some(t),
            Err(message) => {
                fields.insert("incident_type".to_string(), message);
                None
            }
        };
        if self.description.trim().is_empty() {
            fields.insert("description".to_string(), "must not be empty".to_string());
        }
        match (incident_type, fields.is_empty()) {
            (Some(incident_type), true) => Ok(CreateIncident {
                device_id: DeviceId(self.device_id),
                incident_type,
                description: self.description,
            }),
            _ => Err(Error::Validation(fields)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStatusRequest {
    pub(crate) status: String,
}

impl UpdateStatusRequest {
    pub(crate) fn validate(&self) -> Result<IncidentStatus, Error> {
        self.status.parse::<IncidentStatus>().map_err(|message| {
            let mut fields = BTreeMap::new();
            fields.insert("status".to_string(), message);
            Error::Validation(fields)
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) technician_id: i64,
    pub(crate) notes: Option<String>,
}

// ── Query strings ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IncidentListQuery {
    pub(crate) status: Option<String>,
    pub(crate) device_id: Option<i64>,
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeviceListQuery {
    pub(crate) store_id: Option<i64>,
    pub(crate) status: Option<String>,
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TelemetryHistoryQuery {
    pub(crate) from: Option<String>,
    pub(crate) to: Option<String>,
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TechnicianListQuery {
    pub(crate) region: Option<String>,
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StoreListQuery {
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AlertListQuery {
    pub(crate) limit: Option<usize>,
}

/// Parse an optional query-string enum with a field-level error on failure.
pub(crate) fn parse_query_enum<T: std::str::FromStr<Err = String>>(
    field: &str,
    raw: &Option<String>,
) -> Result<Option<T>, Error> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|message| {
            let mut fields = BTreeMap::new();
            fields.insert(field.to_string(), message);
            Error::Validation(fields)
        }),
    }
}

/// Parse an optional RFC 3339 query-string timestamp.
pub(crate) fn parse_query_timestamp(
    field: &str,
    raw: &Option<String>,
) -> Result<Option<OffsetDateTime>, Error> {
    match raw {
        None => Ok(None),
        Some(raw) => OffsetDateTime::parse(raw, &Rfc3339).map(Some).map_err(|_| {
            let mut fields = BTreeMap::new();
            fields.insert(
                field.to_string(),
                "must be an RFC 3339 timestamp".to_string(),
            );
            Error::Validation(fields)
        }),
    }
}

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadingResponse {
    pub(crate) id: ReadingId,
    pub(crate) device_id: DeviceId,
    pub(crate) temperature: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) recorded_at: OffsetDateTime,
    pub(crate) is_alert: bool,
}

impl From<Reading> for ReadingResponse {
    fn from(reading: Reading) -> Self {
        Self {
            id: reading.id,
            device_id: reading.device_id,
            temperature: reading.temperature,
            recorded_at: reading.recorded_at,
            is_alert: reading.is_alert,
        }
    }
}

/// Device as exposed over the API. The credential key is deliberately
/// absent.
#[derive(Debug, Serialize)]
pub(crate) struct DeviceResponse {
    pub(crate) id: DeviceId,
    pub(crate) unit_id: UnitId,
    pub(crate) serial: String,
    pub(crate) min_threshold: f64,
    pub(crate) max_threshold: f64,
    pub(crate) status: DeviceStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) last_seen_at: Option<OffsetDateTime>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            unit_id: device.unit_id,
            serial: device.serial,
            min_threshold: device.min_threshold,
            max_threshold: device.max_threshold,
            status: device.status,
            last_seen_at: device.last_seen_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceDetailResponse {
    #[serde(flatten)]
    pub(crate) device: DeviceResponse,
    pub(crate) latest_reading: Option<ReadingResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IncidentResponse {
    pub(crate) id: IncidentId,
    pub(crate) device_id: DeviceId,
    pub(crate) incident_type: IncidentType,
    pub(crate) status: IncidentStatus,
    pub(crate) description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) resolved_at: Option<OffsetDateTime>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            device_id: incident.device_id,
            incident_type: incident.incident_type,
            status: incident.status,
            description: incident.description,
            created_at: incident.created_at,
            resolved_at: incident.resolved_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IncidentDetailResponse {
    #[serde(flatten)]
    pub(crate) incident: IncidentResponse,
    pub(crate) assignments: Vec<AssignmentResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: AssignmentId,
    pub(crate) incident_id: IncidentId,
    pub(crate) technician_id: TechnicianId,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) assigned_at: OffsetDateTime,
    pub(crate) notes: Option<String>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            incident_id: assignment.incident_id,
            technician_id: assignment.technician_id,
            assigned_at: assignment.assigned_at,
            notes: assignment.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TechnicianResponse {
    pub(crate) id: TechnicianId,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) region: String,
}

impl From<Technician> for TechnicianResponse {
    fn from(technician: Technician) -> Self {
        Self {
            id: technician.id,
            full_name: technician.full_name,
            email: technician.email,
            phone: technician.phone,
            region: technician.region,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StoreResponse {
    pub(crate) id: StoreId,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) city: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

impl From<Store> for StoreResponse {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            code: store.code,
            name: store.name,
            city: store.city,
            created_at: store.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UnitResponse {
    pub(crate) id: UnitId,
    pub(crate) store_id: StoreId,
    pub(crate) unit_type: UnitType,
    pub(crate) name: String,
    pub(crate) location: String,
}

impl From<coldwatch_core::EquipmentUnit> for UnitResponse {
    fn from(unit: coldwatch_core::EquipmentUnit) -> Self {
        Self {
            id: unit.id,
            store_id: unit.store_id,
            unit_type: unit.unit_type,
            name: unit.name,
            location: unit.location,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    pub(crate) total_stores: u64,
    pub(crate) active_devices: u64,
    pub(crate) faulty_devices: u64,
    pub(crate) open_incidents: u64,
    pub(crate) alerts_last_hour: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) as_of: OffsetDateTime,
}

impl DashboardResponse {
    pub(crate) fn new(
        counts: DashboardCounts,
        alerts_last_hour: u64,
        as_of: OffsetDateTime,
    ) -> Self {
        Self {
            total_stores: counts.total_stores,
            active_devices: counts.active_devices,
            faulty_devices: counts.faulty_devices,
            open_incidents: counts.open_incidents,
            alerts_last_hour,
            as_of,
        }
    }
}
