//! Directory and reference-data records owned by external collaborators.
//!
//! Stores, equipment units, technicians, and users are provisioned outside
//! the core workflow; the core only reads them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{StoreId, TechnicianId, UnitId};

/// A retail store location.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub id: StoreId,
    pub code: String,
    pub name: String,
    pub city: String,
    pub created_at: OffsetDateTime,
}

/// Kind of refrigeration/HVAC equipment a unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    Freezer,
    Chiller,
    Hvac,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Freezer => "FREEZER",
            UnitType::Chiller => "CHILLER",
            UnitType::Hvac => "HVAC",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of monitored equipment within a store.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentUnit {
    pub id: UnitId,
    pub store_id: StoreId,
    pub unit_type: UnitType,
    pub name: String,
    pub location: String,
}

/// A field technician who can be assigned to incidents.
#[derive(Debug, Clone, PartialEq)]
pub struct Technician {
    pub id: TechnicianId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub region: String,
}

/// Capability set attached to a principal. Used for authorization only,
/// never for business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Operator,
    Device,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
            Role::Device => "DEVICE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OPERATOR" => Ok(Role::Operator),
            "DEVICE" => Ok(Role::Device),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A human account in the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    /// Argon2 PHC-format hash, never the plaintext.
    pub password_hash: String,
    pub role: Role,
}
