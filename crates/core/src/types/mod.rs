//! Entity types and identifier newtypes.
//!
//! Entities reference each other by identifier only. Read paths fetch
//! related rows explicitly through the storage layer rather than walking a
//! live object graph, so nothing here holds a reference to another entity.

pub mod device;
pub mod directory;
pub mod incident;
pub mod telemetry;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use device::{Device, DeviceStatus};
pub use directory::{EquipmentUnit, Role, Store, Technician, UnitType, User};
pub use incident::{Assignment, Incident, IncidentStatus, IncidentType};
pub use telemetry::Reading;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                $name(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of an IoT device.
    DeviceId
);
id_type!(
    /// Identifier of a persisted telemetry reading.
    ReadingId
);
id_type!(
    /// Identifier of an incident.
    IncidentId
);
id_type!(
    /// Identifier of a technician assignment record.
    AssignmentId
);
id_type!(
    /// Identifier of a technician.
    TechnicianId
);
id_type!(
    /// Identifier of a retail store.
    StoreId
);
id_type!(
    /// Identifier of an equipment unit within a store.
    UnitId
);
