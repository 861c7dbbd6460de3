//! The telemetry ingestion pipeline.
//!
//! One reading flows through fixed stages: resolve the device, pass the
//! rate limiter, then, under the device lease, evaluate thresholds,
//! persist the reading, update the device's `last_seen_at` and status, and
//! open an incident if the reading alerts and none is already OPEN.
//! A rejected reading (unknown device, rate limited) persists nothing.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};

use coldwatch_auth::Principal;
use coldwatch_core::{breach, DeviceId, DeviceStatus, Error, Incident, Reading};
use coldwatch_storage::{NewReading, TelemetryStore};

use crate::incidents;
use crate::rate_limit::RateLimiter;

/// One reading as submitted by a device.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub device_id: DeviceId,
    pub temperature: f64,
    /// Measurement time as reported by the device.
    pub recorded_at: OffsetDateTime,
}

/// What one accepted ingestion did: the stored reading, plus the incident
/// the alert opened when it opened one.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub opened_incident: Option<Incident>,
}

/// Drives readings through validation, admission, persistence, and
/// incident creation.
pub struct IngestionPipeline<S> {
    store: Arc<S>,
    limiter: RateLimiter,
}

impl<S: TelemetryStore> IngestionPipeline<S> {
    pub fn new(store: Arc<S>, readings_per_minute: usize) -> Self {
        Self {
            store,
            limiter: RateLimiter::new(readings_per_minute),
        }
    }

    /// Ingest one reading on behalf of `principal`.
    ///
    /// Only device principals may ingest, and only for devices that exist.
    /// The lease makes the persist/touch/incident section atomic against
    /// concurrent ingests for the same device, so a burst of alerting
    /// readings yields exactly one OPEN incident.
    pub async fn ingest(
        &self,
        principal: &Principal,
        request: IngestRequest,
    ) -> Result<IngestOutcome, Error> {
        principal.require_device()?;
        // A device credential only speaks for its own device.
        if principal.device_id() != Some(request.device_id) {
            return Err(Error::Forbidden(
                "device credential does not match the target device".to_string(),
            ));
        }
        let device = self.store.device(request.device_id).await?;

        let now = OffsetDateTime::now_utc();
        self.limiter
            .admit(device.id, now)
            .map_err(|retry_after| Error::RateLimited { retry_after })?;

        let mut lease = self.store.lease_device(device.id).await?;
        let breach = breach(
            request.temperature,
            device.min_threshold,
            device.max_threshold,
        );
        let reading = self
            .store
            .insert_reading(
                &mut lease,
                NewReading {
                    device_id: device.id,
                    temperature: request.temperature,
                    recorded_at: request.recorded_at,
                    is_alert: breach.is_some(),
                },
            )
            .await?;
        // An alert marks the device FAULT; the flag stays until an operator
        // clears it, an in-band reading does not reset it.
        let status = breach.map(|_| DeviceStatus::Fault);
        self.store
            .touch_device(&mut lease, device.id, now, status)
            .await?;

        let mut opened_incident = None;
        if let Some(breach) = breach {
            opened_incident = incidents::ensure_open(
                self.store.as_ref(),
                &mut lease,
                &device,
                breach,
                request.temperature,
                now,
            )
            .await?;
            if let Some(incident) = &opened_incident {
                info!(
                    device = %device.serial,
                    incident = %incident.id,
                    temperature = request.temperature,
                    "alerting reading opened an incident"
                );
            } else {
                debug!(
                    device = %device.serial,
                    temperature = request.temperature,
                    "alerting reading folded into the existing open incident"
                );
            }
        }

        Ok(IngestOutcome {
            reading,
            opened_incident,
        })
    }
}
