use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{DeviceId, UnitId};

/// Operational status of a device.
///
/// `Fault` is set by the ingestion pipeline on an alerting reading and is
/// never cleared automatically; recovery to `Active` is an administrative
/// action outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Active,
    Fault,
    Inactive,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "ACTIVE",
            DeviceStatus::Fault => "FAULT",
            DeviceStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(DeviceStatus::Active),
            "FAULT" => Ok(DeviceStatus::Fault),
            "INACTIVE" => Ok(DeviceStatus::Inactive),
            other => Err(format!("unknown device status '{}'", other)),
        }
    }
}

/// A temperature sensor attached to one equipment unit.
///
/// The core reads `min_threshold`/`max_threshold` and identity, and writes
/// only `status` and `last_seen_at`. `device_key` is the per-device
/// credential presented in the `X-Device-Key` header; it never appears in
/// API responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub unit_id: UnitId,
    pub serial: String,
    pub device_key: String,
    /// Lower bound of the acceptable band. Invariant: `min_threshold <= max_threshold`.
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub status: DeviceStatus,
    pub last_seen_at: Option<OffsetDateTime>,
}
