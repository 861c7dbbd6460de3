//! Core domain model for the coldwatch telemetry service.
//!
//! This crate holds the pure, storage-free parts of the system: identifier
//! newtypes, the entity types (devices, readings, incidents, assignments,
//! directory records), the threshold evaluator, and the closed error
//! taxonomy shared by every other crate. Nothing here performs I/O.

pub mod error;
pub mod threshold;
pub mod types;

pub use error::{Error, Result};
pub use threshold::{breach, is_alert, Breach};
pub use types::{
    Assignment, AssignmentId, Device, DeviceId, DeviceStatus, EquipmentUnit, Incident, IncidentId,
    IncidentStatus, IncidentType, Reading, ReadingId, Role, Store, StoreId, Technician,
    TechnicianId, UnitId, UnitType, User,
};
