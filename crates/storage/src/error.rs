use coldwatch_core::{DeviceId, Error, IncidentId, IncidentStatus, StoreId, TechnicianId};

/// All errors that can be returned by a [`crate::TelemetryStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IoT device with id {0} not found")]
    DeviceNotFound(DeviceId),

    #[error("incident with id {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("technician with id {0} not found")]
    TechnicianNotFound(TechnicianId),

    #[error("store with id {0} not found")]
    StoreNotFound(StoreId),

    /// Uniqueness backstop: an OPEN incident already exists for the device.
    /// Under the per-device lease this cannot race, but the backend re-checks
    /// the invariant on every insert regardless.
    #[error("an open incident (id {incident_id}) already exists for device {device_id}")]
    OpenIncidentExists {
        device_id: DeviceId,
        incident_id: IncidentId,
    },

    /// Compare-and-set failure: the incident's status was not the expected
    /// one at update time. Another request transitioned it concurrently.
    #[error("incident {incident_id} was not in expected status {expected}")]
    StaleIncidentStatus {
        incident_id: IncidentId,
        expected: IncidentStatus,
    },

    /// Terminal-state backstop: assignment rows may not be added to a
    /// RESOLVED incident, even when the resolution landed concurrently.
    #[error("incident {0} is RESOLVED and cannot accept an assignment")]
    IncidentResolved(IncidentId),

    /// A backend-specific failure (connection, serialization, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DeviceNotFound(_)
            | StorageError::IncidentNotFound(_)
            | StorageError::TechnicianNotFound(_)
            | StorageError::StoreNotFound(_) => Error::NotFound(err.to_string()),
            StorageError::OpenIncidentExists { .. } | StorageError::StaleIncidentStatus { .. } => {
                Error::Conflict(err.to_string())
            }
            StorageError::IncidentResolved(_) => Error::BadRequest(err.to_string()),
            StorageError::Backend(msg) => Error::Internal(msg),
        }
    }
}
