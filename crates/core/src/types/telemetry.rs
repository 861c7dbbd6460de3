use time::OffsetDateTime;

use super::{DeviceId, ReadingId};

/// A single persisted temperature reading.
///
/// `recorded_at` is the caller-supplied measurement time, not the server
/// receipt time. `is_alert` is computed once at ingestion from the device's
/// thresholds at that moment and is immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: ReadingId,
    pub device_id: DeviceId,
    pub temperature: f64,
    pub recorded_at: OffsetDateTime,
    pub is_alert: bool,
}
