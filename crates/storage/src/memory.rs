//! In-memory storage backend.
//!
//! Rows live in arenas keyed by identifier behind one `RwLock`; per-device
//! leases are backed by a lazily created `tokio::sync::Mutex` per device.
//! This backend powers the server's default configuration and every test
//! suite in the workspace.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use coldwatch_core::{
    Assignment, AssignmentId, Device, DeviceId, DeviceStatus, EquipmentUnit, Incident, IncidentId,
    IncidentStatus, Reading, ReadingId, Store, StoreId, Technician, TechnicianId, UnitId,
    UnitType, User,
};

use crate::error::StorageError;
use crate::record::{DashboardCounts, NewAssignment, NewIncident, NewReading};
use crate::traits::TelemetryStore;

/// Exclusive guard over one device's rows.
///
/// The guard pins the device id it was issued for; every lease-taking method
/// asserts the ids match, so a lease can never be replayed against a
/// different device.
#[derive(Debug)]
pub struct DeviceLease {
    device_id: DeviceId,
    _guard: OwnedMutexGuard<()>,
}

#[derive(Default)]
struct Inner {
    devices: BTreeMap<DeviceId, Device>,
    readings: BTreeMap<ReadingId, Reading>,
    incidents: BTreeMap<IncidentId, Incident>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    technicians: BTreeMap<TechnicianId, Technician>,
    stores: BTreeMap<StoreId, Store>,
    units: BTreeMap<UnitId, EquipmentUnit>,
    users: BTreeMap<String, User>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn open_incident_for(&self, device_id: DeviceId) -> Option<&Incident> {
        self.incidents
            .values()
            .find(|i| i.device_id == device_id && i.status == IncidentStatus::Open)
    }
}

/// In-memory [`TelemetryStore`] backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    device_locks: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_lease(lease: &DeviceLease, device_id: DeviceId) -> Result<(), StorageError> {
        if lease.device_id != device_id {
            return Err(StorageError::Backend(format!(
                "lease for device {} used against device {}",
                lease.device_id, device_id
            )));
        }
        Ok(())
    }

    // ── Provisioning (seeding and tests) ─────────────────────────────────────

    pub async fn add_store(&self, code: &str, name: &str, city: &str) -> Store {
        let mut inner = self.inner.write().await;
        let store = Store {
            id: StoreId(inner.next_id()),
            code: code.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.stores.insert(store.id, store.clone());
        store
    }

    pub async fn add_unit(
        &self,
        store_id: StoreId,
        unit_type: UnitType,
        name: &str,
        location: &str,
    ) -> EquipmentUnit {
        let mut inner = self.inner.write().await;
        let unit = EquipmentUnit {
            id: UnitId(inner.next_id()),
            store_id,
            unit_type,
            name: name.to_string(),
            location: location.to_string(),
        };
        inner.units.insert(unit.id, unit.clone());
        unit
    }

    pub async fn add_device(
        &self,
        unit_id: UnitId,
        serial: &str,
        device_key: &str,
        min_threshold: f64,
        max_threshold: f64,
    ) -> Device {
        let mut inner = self.inner.write().await;
        let device = Device {
            id: DeviceId(inner.next_id()),
            unit_id,
            serial: serial.to_string(),
            device_key: device_key.to_string(),
            min_threshold,
            max_threshold,
            status: DeviceStatus::Active,
            last_seen_at: None,
        };
        inner.devices.insert(device.id, device.clone());
        device
    }

    pub async fn add_technician(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        region: &str,
    ) -> Technician {
        let mut inner = self.inner.write().await;
        let technician = Technician {
            id: TechnicianId(inner.next_id()),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            region: region.to_string(),
        };
        inner.technicians.insert(technician.id, technician.clone());
        technician
    }

    pub async fn add_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.email.clone(), user);
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    type Lease = DeviceLease;

    async fn lease_device(&self, device_id: DeviceId) -> Result<Self::Lease, StorageError> {
        {
            let inner = self.inner.read().await;
            if !inner.devices.contains_key(&device_id) {
                return Err(StorageError::DeviceNotFound(device_id));
            }
        }
        let lock = {
            let mut locks = self.device_locks.lock().await;
            locks
                .entry(device_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        Ok(DeviceLease {
            device_id,
            _guard: guard,
        })
    }

    async fn device(&self, id: DeviceId) -> Result<Device, StorageError> {
        let inner = self.inner.read().await;
        inner
            .devices
            .get(&id)
            .cloned()
            .ok_or(StorageError::DeviceNotFound(id))
    }

    async fn device_by_key(&self, key: &str) -> Result<Option<Device>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.devices.values().find(|d| d.device_key == key).cloned())
    }

    async fn list_devices(
        &self,
        store_id: Option<StoreId>,
        status: Option<DeviceStatus>,
        limit: usize,
    ) -> Result<Vec<Device>, StorageError> {
        let inner = self.inner.read().await;
        let mut devices: Vec<Device> = inner
            .devices
            .values()
            .filter(|d| {
                let in_store = match store_id {
                    Some(sid) => inner.units.get(&d.unit_id).map(|u| u.store_id) == Some(sid),
                    None => true,
                };
                in_store && status.map_or(true, |s| d.status == s)
            })
            .cloned()
            .collect();
        if limit > 0 {
            devices.truncate(limit);
        }
        Ok(devices)
    }

    async fn touch_device(
        &self,
        lease: &mut Self::Lease,
        id: DeviceId,
        seen_at: OffsetDateTime,
        status: Option<DeviceStatus>,
    ) -> Result<(), StorageError> {
        Self::check_lease(lease, id)?;
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&id)
            .ok_or(StorageError::DeviceNotFound(id))?;
        device.last_seen_at = Some(seen_at);
        if let Some(status) = status {
            device.status = status;
        }
        Ok(())
    }

    async fn insert_reading(
        &self,
        lease: &mut Self::Lease,
        reading: NewReading,
    ) -> Result<Reading, StorageError> {
        Self::check_lease(lease, reading.device_id)?;
        let mut inner = self.inner.write().await;
        if !inner.devices.contains_key(&reading.device_id) {
            return Err(StorageError::DeviceNotFound(reading.device_id));
        }
        let row = Reading {
            id: ReadingId(inner.next_id()),
            device_id: reading.device_id,
            temperature: reading.temperature,
            recorded_at: reading.recorded_at,
            is_alert: reading.is_alert,
        };
        inner.readings.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_readings(
        &self,
        device_id: DeviceId,
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
        limit: usize,
    ) -> Result<Vec<Reading>, StorageError> {
        let inner = self.inner.read().await;
        if !inner.devices.contains_key(&device_id) {
            return Err(StorageError::DeviceNotFound(device_id));
        }
        let mut readings: Vec<Reading> = inner
            .readings
            .values()
            .filter(|r| {
                r.device_id == device_id
                    && from.map_or(true, |f| r.recorded_at >= f)
                    && to.map_or(true, |t| r.recorded_at <= t)
            })
            .cloned()
            .collect();
        readings.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if limit > 0 {
            readings.truncate(limit);
        }
        Ok(readings)
    }

    async fn latest_reading(&self, device_id: DeviceId) -> Result<Option<Reading>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .readings
            .values()
            .filter(|r| r.device_id == device_id)
            .max_by_key(|r| r.recorded_at)
            .cloned())
    }

    async fn count_alerts_since(&self, since: OffsetDateTime) -> Result<u64, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .readings
            .values()
            .filter(|r| r.is_alert && r.recorded_at > since)
            .count() as u64)
    }

    async fn open_incident(
        &self,
        lease: &mut Self::Lease,
        device_id: DeviceId,
    ) -> Result<Option<Incident>, StorageError> {
        Self::check_lease(lease, device_id)?;
        let inner = self.inner.read().await;
        Ok(inner.open_incident_for(device_id).cloned())
    }

    async fn insert_incident(
        &self,
        lease: &mut Self::Lease,
        incident: NewIncident,
    ) -> Result<Incident, StorageError> {
        Self::check_lease(lease, incident.device_id)?;
        let mut inner = self.inner.write().await;
        if !inner.devices.contains_key(&incident.device_id) {
            return Err(StorageError::DeviceNotFound(incident.device_id));
        }
        if let Some(existing) = inner.open_incident_for(incident.device_id) {
            return Err(StorageError::OpenIncidentExists {
                device_id: incident.device_id,
                incident_id: existing.id,
            });
        }
        let row = Incident {
            id: IncidentId(inner.next_id()),
            device_id: incident.device_id,
            incident_type: incident.incident_type,
            status: IncidentStatus::Open,
            description: incident.description,
            created_at: incident.created_at,
            resolved_at: None,
        };
        inner.incidents.insert(row.id, row.clone());
        Ok(row)
    }

    async fn incident(&self, id: IncidentId) -> Result<Incident, StorageError> {
        let inner = self.inner.read().await;
        inner
            .incidents
            .get(&id)
            .cloned()
            .ok_or(StorageError::IncidentNotFound(id))
    }

    async fn update_incident_status(
        &self,
        id: IncidentId,
        expected: IncidentStatus,
        to: IncidentStatus,
        resolved_at: Option<OffsetDateTime>,
    ) -> Result<Incident, StorageError> {
        let mut inner = self.inner.write().await;
        let incident = inner
            .incidents
            .get_mut(&id)
            .ok_or(StorageError::IncidentNotFound(id))?;
        if incident.status != expected {
            return Err(StorageError::StaleIncidentStatus {
                incident_id: id,
                expected,
            });
        }
        incident.status = to;
        incident.resolved_at = resolved_at;
        Ok(incident.clone())
    }

    async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        device_id: Option<DeviceId>,
        limit: usize,
    ) -> Result<Vec<Incident>, StorageError> {
        let inner = self.inner.read().await;
        let mut incidents: Vec<Incident> = inner
            .incidents
            .values()
            .filter(|i| {
                status.map_or(true, |s| i.status == s)
                    && device_id.map_or(true, |d| i.device_id == d)
            })
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if limit > 0 {
            incidents.truncate(limit);
        }
        Ok(incidents)
    }

    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StorageError> {
        let mut inner = self.inner.write().await;
        let incident = inner
            .incidents
            .get(&assignment.incident_id)
            .ok_or(StorageError::IncidentNotFound(assignment.incident_id))?;
        if incident.status == IncidentStatus::Resolved {
            return Err(StorageError::IncidentResolved(assignment.incident_id));
        }
        if !inner.technicians.contains_key(&assignment.technician_id) {
            return Err(StorageError::TechnicianNotFound(assignment.technician_id));
        }
        let row = Assignment {
            id: AssignmentId(inner.next_id()),
            incident_id: assignment.incident_id,
            technician_id: assignment.technician_id,
            assigned_at: assignment.assigned_at,
            notes: assignment.notes,
        };
        inner.assignments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn assignments_for(
        &self,
        incident_id: IncidentId,
    ) -> Result<Vec<Assignment>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .assignments
            .values()
            .filter(|a| a.incident_id == incident_id)
            .cloned()
            .collect())
    }

    async fn technician(&self, id: TechnicianId) -> Result<Technician, StorageError> {
        let inner = self.inner.read().await;
        inner
            .technicians
            .get(&id)
            .cloned()
            .ok_or(StorageError::TechnicianNotFound(id))
    }

    async fn list_technicians(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Technician>, StorageError> {
        let inner = self.inner.read().await;
        let mut technicians: Vec<Technician> = inner
            .technicians
            .values()
            .filter(|t| region.map_or(true, |r| t.region.eq_ignore_ascii_case(r)))
            .cloned()
            .collect();
        if limit > 0 {
            technicians.truncate(limit);
        }
        Ok(technicians)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(email).cloned())
    }

    async fn store(&self, id: StoreId) -> Result<Store, StorageError> {
        let inner = self.inner.read().await;
        inner
            .stores
            .get(&id)
            .cloned()
            .ok_or(StorageError::StoreNotFound(id))
    }

    async fn list_stores(&self, limit: usize) -> Result<Vec<Store>, StorageError> {
        let inner = self.inner.read().await;
        let mut stores: Vec<Store> = inner.stores.values().cloned().collect();
        if limit > 0 {
            stores.truncate(limit);
        }
        Ok(stores)
    }

    async fn units_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<EquipmentUnit>, StorageError> {
        let inner = self.inner.read().await;
        if !inner.stores.contains_key(&store_id) {
            return Err(StorageError::StoreNotFound(store_id));
        }
        Ok(inner
            .units
            .values()
            .filter(|u| u.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn alert_devices(&self, limit: usize) -> Result<Vec<Device>, StorageError> {
        let inner = self.inner.read().await;
        let mut devices: Vec<Device> = inner
            .devices
            .values()
            .filter(|d| {
                d.status == DeviceStatus::Fault
                    || inner
                        .readings
                        .values()
                        .filter(|r| r.device_id == d.id)
                        .max_by_key(|r| r.recorded_at)
                        .is_some_and(|r| r.is_alert)
            })
            .cloned()
            .collect();
        if limit > 0 {
            devices.truncate(limit);
        }
        Ok(devices)
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, StorageError> {
        let inner = self.inner.read().await;
        Ok(DashboardCounts {
            total_stores: inner.stores.len() as u64,
            active_devices: inner
                .devices
                .values()
                .filter(|d| d.status == DeviceStatus::Active)
                .count() as u64,
            faulty_devices: inner
                .devices
                .values()
                .filter(|d| d.status == DeviceStatus::Fault)
                .count() as u64,
            open_incidents: inner
                .incidents
                .values()
                .filter(|i| i.status == IncidentStatus::Open)
                .count() as u64,
        })
    }
}
