//! Per-device sliding-window admission control.
//!
//! Each device may land at most `capacity` readings inside any 60-second
//! window. The window is tracked as the timestamps of recently admitted
//! readings; rejected attempts are not recorded and do not extend the
//! window.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use time::{Duration, OffsetDateTime};

use coldwatch_core::DeviceId;

const WINDOW: Duration = Duration::seconds(60);

/// Sliding-window rate limiter keyed by device.
///
/// A single `Mutex` over the whole map keeps the prune-check-record sequence
/// atomic; the critical section is a handful of `VecDeque` operations, so
/// contention across devices is not a concern at ingestion volumes.
pub struct RateLimiter {
    capacity: usize,
    windows: Mutex<HashMap<DeviceId, VecDeque<OffsetDateTime>>>,
}

impl RateLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit one ingestion attempt at `now`, or reject it with the number of
    /// seconds after which a retry could succeed.
    ///
    /// Admission and recording happen atomically: two concurrent calls for
    /// the same device can never both be admitted into the last remaining
    /// slot.
    pub fn admit(&self, device_id: DeviceId, now: OffsetDateTime) -> Result<(), u64> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(device_id).or_default();
        while window.front().is_some_and(|t| now - *t >= WINDOW) {
            window.pop_front();
        }
        if window.len() >= self.capacity {
            // The oldest admitted timestamp leaves the window first.
            let retry_after = window
                .front()
                .map(|oldest| (WINDOW - (now - *oldest)).whole_seconds().max(1) as u64)
                .unwrap_or(0);
            return Err(retry_after);
        }
        window.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rejects_once_capacity_is_reached() {
        let limiter = RateLimiter::new(2);
        let t0 = datetime!(2026-01-15 12:00:00 UTC);
        assert!(limiter.admit(DeviceId(1), t0).is_ok());
        assert!(limiter.admit(DeviceId(1), t0 + Duration::seconds(10)).is_ok());
        let retry_after = limiter
            .admit(DeviceId(1), t0 + Duration::seconds(20))
            .unwrap_err();
        // The oldest slot frees up 60s after t0, i.e. 40s from now.
        assert_eq!(retry_after, 40);
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1);
        let t0 = datetime!(2026-01-15 12:00:00 UTC);
        assert!(limiter.admit(DeviceId(1), t0).is_ok());
        assert!(limiter.admit(DeviceId(1), t0 + Duration::seconds(59)).is_err());
        assert!(limiter.admit(DeviceId(1), t0 + Duration::seconds(60)).is_ok());
    }

    #[test]
    fn devices_do_not_share_a_window() {
        let limiter = RateLimiter::new(1);
        let t0 = datetime!(2026-01-15 12:00:00 UTC);
        assert!(limiter.admit(DeviceId(1), t0).is_ok());
        assert!(limiter.admit(DeviceId(2), t0).is_ok());
        assert!(limiter.admit(DeviceId(1), t0).is_err());
    }

    #[test]
    fn rejections_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1);
        let t0 = datetime!(2026-01-15 12:00:00 UTC);
        assert!(limiter.admit(DeviceId(1), t0).is_ok());
        for s in 1..60 {
            assert!(limiter.admit(DeviceId(1), t0 + Duration::seconds(s)).is_err());
        }
        assert!(limiter.admit(DeviceId(1), t0 + Duration::seconds(60)).is_ok());
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let limiter = RateLimiter::new(0);
        let t0 = datetime!(2026-01-15 12:00:00 UTC);
        assert_eq!(limiter.admit(DeviceId(1), t0), Err(0));
    }
}
