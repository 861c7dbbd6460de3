//! Incident lifecycle: OPEN -> ASSIGNED -> RESOLVED.
//!
//! Creation, manual or automatic, happens under the device lease so the
//! at-most-one-OPEN-incident check cannot race with a concurrent creator.
//! Status transitions use a compare-and-set on the status the caller
//! observed, so two concurrent transitions cannot both apply.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use coldwatch_auth::Principal;
use coldwatch_core::{
    Assignment, Breach, Device, DeviceId, Error, Incident, IncidentId, IncidentStatus,
    IncidentType, TechnicianId,
};
use coldwatch_storage::{NewAssignment, NewIncident, StorageError, TelemetryStore};

/// A manual incident creation request.
#[derive(Debug, Clone)]
pub struct CreateIncident {
    pub device_id: DeviceId,
    pub incident_type: IncidentType,
    pub description: String,
}

/// Operations on incidents, from creation through resolution.
pub struct IncidentLifecycle<S> {
    store: Arc<S>,
}

impl<S> Clone for IncidentLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TelemetryStore> IncidentLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Manually open an incident for a device.
    ///
    /// Rejected with a conflict while the device already has an OPEN
    /// incident; an ASSIGNED or RESOLVED incident does not block creation.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateIncident,
    ) -> Result<Incident, Error> {
        principal.require_human()?;
        let device = self.store.device(request.device_id).await?;
        let mut lease = self.store.lease_device(device.id).await?;
        if let Some(existing) = self.store.open_incident(&mut lease, device.id).await? {
            return Err(Error::Conflict(format!(
                "an open incident (id {}) already exists for device {}; resolve it before creating a new one",
                existing.id, device.id
            )));
        }
        let incident = self
            .store
            .insert_incident(
                &mut lease,
                NewIncident {
                    device_id: device.id,
                    incident_type: request.incident_type,
                    description: request.description,
                    created_at: OffsetDateTime::now_utc(),
                },
            )
            .await?;
        info!(
            incident = %incident.id,
            device = %device.serial,
            incident_type = %incident.incident_type,
            "incident opened manually"
        );
        Ok(incident)
    }

    /// One incident with its full assignment history.
    pub async fn get(
        &self,
        principal: &Principal,
        id: IncidentId,
    ) -> Result<(Incident, Vec<Assignment>), Error> {
        principal.require_human()?;
        let incident = self.store.incident(id).await?;
        let assignments = self.store.assignments_for(id).await?;
        Ok((incident, assignments))
    }

    /// Incidents newest first, optionally filtered by status and device.
    pub async fn list(
        &self,
        principal: &Principal,
        status: Option<IncidentStatus>,
        device_id: Option<DeviceId>,
        limit: usize,
    ) -> Result<Vec<Incident>, Error> {
        principal.require_human()?;
        self.store
            .list_incidents(status, device_id, limit)
            .await
            .map_err(Into::into)
    }

    /// Transition an incident to `to`.
    ///
    /// RESOLVED is terminal: any transition out of it is a bad request, even
    /// a no-op RESOLVED -> RESOLVED. `resolved_at` is stamped exactly once,
    /// on the transition into RESOLVED.
    pub async fn set_status(
        &self,
        principal: &Principal,
        id: IncidentId,
        to: IncidentStatus,
    ) -> Result<Incident, Error> {
        principal.require_human()?;
        let incident = self.store.incident(id).await?;
        if incident.status.is_terminal() {
            return Err(Error::BadRequest(format!(
                "incident {} is RESOLVED and cannot transition to {}",
                id, to
            )));
        }
        let resolved_at = if to == IncidentStatus::Resolved {
            Some(OffsetDateTime::now_utc())
        } else {
            incident.resolved_at
        };
        let updated = self
            .store
            .update_incident_status(id, incident.status, to, resolved_at)
            .await?;
        info!(incident = %id, from = %incident.status, to = %to, "incident status changed");
        Ok(updated)
    }

    /// Assign a technician to an incident.
    ///
    /// Appends to the assignment history and forces the incident to
    /// ASSIGNED. Re-assignment of an already ASSIGNED incident is allowed;
    /// assignment to a RESOLVED one is not.
    pub async fn assign_technician(
        &self,
        principal: &Principal,
        id: IncidentId,
        technician_id: TechnicianId,
        notes: Option<String>,
    ) -> Result<(Incident, Assignment), Error> {
        principal.require_human()?;
        let technician = self.store.technician(technician_id).await?;
        let mut incident = self.store.incident(id).await?;
        if incident.status.is_terminal() {
            return Err(Error::BadRequest(format!(
                "incident {} is RESOLVED and cannot be assigned",
                id
            )));
        }
        // Mark ASSIGNED before writing the assignment row. In the other
        // order a resolution landing between the two writes would leave
        // history on a RESOLVED incident; this way the backend's terminal
        // backstop rejects the row and nothing persists.
        if incident.status == IncidentStatus::Open {
            incident = match self
                .store
                .update_incident_status(id, IncidentStatus::Open, IncidentStatus::Assigned, None)
                .await
            {
                Ok(updated) => updated,
                Err(StorageError::StaleIncidentStatus { .. }) => {
                    let current = self.store.incident(id).await?;
                    if current.status.is_terminal() {
                        return Err(Error::BadRequest(format!(
                            "incident {} is RESOLVED and cannot be assigned",
                            id
                        )));
                    }
                    current
                }
                Err(err) => return Err(err.into()),
            };
        }
        let assignment = self
            .store
            .insert_assignment(NewAssignment {
                incident_id: id,
                technician_id: technician.id,
                assigned_at: OffsetDateTime::now_utc(),
                notes,
            })
            .await?;
        info!(
            incident = %id,
            technician = %technician.full_name,
            "technician assigned"
        );
        Ok((incident, assignment))
    }
}

/// Open an incident for an alerting reading unless the device already has
/// an OPEN one. Runs under the caller's device lease.
///
/// Returns the created incident, or `None` when an OPEN incident already
/// absorbed the alert.
pub(crate) async fn ensure_open<S: TelemetryStore>(
    store: &S,
    lease: &mut S::Lease,
    device: &Device,
    breach: Breach,
    temperature: f64,
    now: OffsetDateTime,
) -> Result<Option<Incident>, Error> {
    if store.open_incident(lease, device.id).await?.is_some() {
        return Ok(None);
    }
    let incident = store
        .insert_incident(
            lease,
            NewIncident {
                device_id: device.id,
                incident_type: breach.into(),
                description: describe_breach(device, breach, temperature),
                created_at: now,
            },
        )
        .await;
    match incident {
        Ok(incident) => Ok(Some(incident)),
        // The backend's uniqueness backstop tripped: another creator won,
        // and this alert folds into the existing OPEN incident.
        Err(StorageError::OpenIncidentExists { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn describe_breach(device: &Device, breach: Breach, temperature: f64) -> String {
    match breach {
        Breach::AboveMax => format!(
            "Temperature exceeded max threshold of {:.1}°C. Recorded: {:.1}°C",
            device.max_threshold, temperature
        ),
        Breach::BelowMin => format!(
            "Temperature below min threshold of {:.1}°C. Recorded: {:.1}°C",
            device.min_threshold, temperature
        ),
    }
}
