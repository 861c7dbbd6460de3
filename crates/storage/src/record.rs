use time::OffsetDateTime;

use coldwatch_core::{DeviceId, IncidentId, IncidentType, TechnicianId};

/// Insert form of a telemetry reading. The backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub device_id: DeviceId,
    pub temperature: f64,
    /// Caller-supplied measurement time, not server receipt time.
    pub recorded_at: OffsetDateTime,
    /// Computed once at ingestion; immutable after insert.
    pub is_alert: bool,
}

/// Insert form of an incident. Status is always OPEN on insert.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub device_id: DeviceId,
    pub incident_type: IncidentType,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// Insert form of a technician assignment.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub incident_id: IncidentId,
    pub technician_id: TechnicianId,
    pub assigned_at: OffsetDateTime,
    pub notes: Option<String>,
}

/// Aggregate counts for the dashboard summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub total_stores: u64,
    pub active_devices: u64,
    pub faulty_devices: u64,
    pub open_incidents: u64,
}
