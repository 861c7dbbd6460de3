use async_trait::async_trait;
use time::OffsetDateTime;

use coldwatch_core::{
    Assignment, Device, DeviceId, DeviceStatus, EquipmentUnit, Incident, IncidentId,
    IncidentStatus, Reading, Store, StoreId, Technician, TechnicianId, User,
};

use crate::error::StorageError;
use crate::record::{DashboardCounts, NewAssignment, NewIncident, NewReading};

/// The storage trait for coldwatch backends.
///
/// ## Lease semantics
///
/// Mutations tied to a single device's rows (persisting a reading, touching
/// `last_seen_at`/`status`, checking for and inserting an OPEN incident)
/// take `&mut Self::Lease`, a per-device mutual-exclusion guard obtained
/// from [`lease_device`](TelemetryStore::lease_device). Holding the lease
/// across the whole read-modify-write section makes the ingestion pipeline's
/// steps atomic with respect to any concurrent ingest or manual incident
/// creation for the same device. Dropping the lease releases it. Leases for
/// distinct devices never contend.
///
/// Read-only queries and mutations with their own consistency story
/// (incident status transitions use a compare-and-set on the current status)
/// run against the backend directly, without a lease.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` so they can live in axum
/// application state and cross async task boundaries.
#[async_trait]
pub trait TelemetryStore: Send + Sync + 'static {
    /// Per-device exclusive guard. Must be `Send` so it can be held across
    /// `.await` points inside the ingestion pipeline.
    type Lease: Send;

    /// Acquire the mutual-exclusion lease for one device.
    ///
    /// Fails with `DeviceNotFound` if the device does not exist.
    async fn lease_device(&self, device_id: DeviceId) -> Result<Self::Lease, StorageError>;

    // ── Devices ──────────────────────────────────────────────────────────────

    async fn device(&self, id: DeviceId) -> Result<Device, StorageError>;

    /// Resolve a device by its credential key. Unknown keys yield `Ok(None)`,
    /// not an error: the caller simply remains unauthenticated.
    async fn device_by_key(&self, key: &str) -> Result<Option<Device>, StorageError>;

    async fn list_devices(
        &self,
        store_id: Option<StoreId>,
        status: Option<DeviceStatus>,
        limit: usize,
    ) -> Result<Vec<Device>, StorageError>;

    /// Update `last_seen_at`, and `status` when `status` is `Some`.
    async fn touch_device(
        &self,
        lease: &mut Self::Lease,
        id: DeviceId,
        seen_at: OffsetDateTime,
        status: Option<DeviceStatus>,
    ) -> Result<(), StorageError>;

    // ── Readings ─────────────────────────────────────────────────────────────

    /// Persist a reading. Readings are immutable once written.
    async fn insert_reading(
        &self,
        lease: &mut Self::Lease,
        reading: NewReading,
    ) -> Result<Reading, StorageError>;

    /// Readings for one device, newest first, optionally bounded by
    /// `recorded_at` range.
    async fn list_readings(
        &self,
        device_id: DeviceId,
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
        limit: usize,
    ) -> Result<Vec<Reading>, StorageError>;

    async fn latest_reading(&self, device_id: DeviceId) -> Result<Option<Reading>, StorageError>;

    /// Count of alerting readings with `recorded_at` after `since`.
    async fn count_alerts_since(&self, since: OffsetDateTime) -> Result<u64, StorageError>;

    // ── Incidents ────────────────────────────────────────────────────────────

    /// The device's OPEN incident, if any. Takes the lease because the
    /// check-then-insert pair must not race with another creator.
    async fn open_incident(
        &self,
        lease: &mut Self::Lease,
        device_id: DeviceId,
    ) -> Result<Option<Incident>, StorageError>;

    /// Insert an incident with status OPEN.
    ///
    /// Re-checks the at-most-one-OPEN-incident invariant and fails with
    /// `OpenIncidentExists` if it would be violated.
    async fn insert_incident(
        &self,
        lease: &mut Self::Lease,
        incident: NewIncident,
    ) -> Result<Incident, StorageError>;

    async fn incident(&self, id: IncidentId) -> Result<Incident, StorageError>;

    /// Compare-and-set status transition.
    ///
    /// The update applies only while the incident's status equals `expected`;
    /// otherwise fails with `StaleIncidentStatus`. `resolved_at` is written
    /// as given (callers set it on the transition into RESOLVED and leave it
    /// untouched otherwise by passing the current value).
    async fn update_incident_status(
        &self,
        id: IncidentId,
        expected: IncidentStatus,
        to: IncidentStatus,
        resolved_at: Option<OffsetDateTime>,
    ) -> Result<Incident, StorageError>;

    /// Incidents newest first, with optional status/device filters.
    async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        device_id: Option<DeviceId>,
        limit: usize,
    ) -> Result<Vec<Incident>, StorageError>;

    // ── Assignments ──────────────────────────────────────────────────────────

    /// Append an assignment record. Fails with `TechnicianNotFound` or
    /// `IncidentNotFound` when a referenced row is missing.
    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StorageError>;

    /// Assignments for an incident in insertion order.
    async fn assignments_for(
        &self,
        incident_id: IncidentId,
    ) -> Result<Vec<Assignment>, StorageError>;

    // ── Directory ────────────────────────────────────────────────────────────

    async fn technician(&self, id: TechnicianId) -> Result<Technician, StorageError>;

    async fn list_technicians(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Technician>, StorageError>;

    /// Unknown emails yield `Ok(None)`; the login path turns that into a
    /// generic Unauthorized so it cannot be used to enumerate accounts.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn store(&self, id: StoreId) -> Result<Store, StorageError>;

    async fn list_stores(&self, limit: usize) -> Result<Vec<Store>, StorageError>;

    async fn units_for_store(&self, store_id: StoreId)
        -> Result<Vec<EquipmentUnit>, StorageError>;

    // ── Dashboard ────────────────────────────────────────────────────────────

    /// Devices currently in an alerting condition: status FAULT, or the
    /// device's most recent reading is an alert.
    async fn alert_devices(&self, limit: usize) -> Result<Vec<Device>, StorageError>;

    async fn dashboard_counts(&self) -> Result<DashboardCounts, StorageError>;
}
