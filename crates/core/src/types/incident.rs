use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{AssignmentId, DeviceId, IncidentId, TechnicianId};
use crate::threshold::Breach;

/// Lifecycle state of an incident: OPEN -> ASSIGNED -> RESOLVED.
///
/// RESOLVED is terminal; no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    Assigned,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Assigned => "ASSIGNED",
            IncidentStatus::Resolved => "RESOLVED",
        }
    }

    /// RESOLVED admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(IncidentStatus::Open),
            "ASSIGNED" => Ok(IncidentStatus::Assigned),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            other => Err(format!("unknown incident status '{}'", other)),
        }
    }
}

/// Cause classification for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    HighTemperature,
    LowTemperature,
    SensorFault,
    Other,
}

impl IncidentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::HighTemperature => "HIGH_TEMPERATURE",
            IncidentType::LowTemperature => "LOW_TEMPERATURE",
            IncidentType::SensorFault => "SENSOR_FAULT",
            IncidentType::Other => "OTHER",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HIGH_TEMPERATURE" => Ok(IncidentType::HighTemperature),
            "LOW_TEMPERATURE" => Ok(IncidentType::LowTemperature),
            "SENSOR_FAULT" => Ok(IncidentType::SensorFault),
            "OTHER" => Ok(IncidentType::Other),
            other => Err(format!("unknown incident type '{}'", other)),
        }
    }
}

impl From<Breach> for IncidentType {
    /// Auto-created incidents derive their type from the breached bound.
    fn from(breach: Breach) -> Self {
        match breach {
            Breach::BelowMin => IncidentType::LowTemperature,
            Breach::AboveMax => IncidentType::HighTemperature,
        }
    }
}

/// An incident raised for one device, either automatically by the ingestion
/// pipeline or manually by an operator.
///
/// Invariant: at most one OPEN incident exists per device at any time.
/// `resolved_at` is set exactly once, on the transition into RESOLVED.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: IncidentId,
    pub device_id: DeviceId,
    pub incident_type: IncidentType,
    pub status: IncidentStatus,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub resolved_at: Option<OffsetDateTime>,
}

/// Append-only record of a technician being assigned to an incident.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: AssignmentId,
    pub incident_id: IncidentId,
    pub technician_id: TechnicianId,
    pub assigned_at: OffsetDateTime,
    pub notes: Option<String>,
}
