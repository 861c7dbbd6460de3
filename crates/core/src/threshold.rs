//! Pure threshold evaluation.
//!
//! A reading is an alert when its temperature falls strictly outside the
//! device's configured band. There is no hysteresis: every evaluation is
//! independent of history, and a reading exactly at either bound is NOT
//! an alert.

/// Which bound a temperature breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    /// Temperature strictly below the minimum threshold.
    BelowMin,
    /// Temperature strictly above the maximum threshold.
    AboveMax,
}

/// Evaluate a temperature against a threshold band.
///
/// Returns the breached bound, or `None` when the temperature lies within
/// `[min, max]` inclusive.
pub fn breach(temperature: f64, min: f64, max: f64) -> Option<Breach> {
    if temperature < min {
        Some(Breach::BelowMin)
    } else if temperature > max {
        Some(Breach::AboveMax)
    } else {
        None
    }
}

/// Alert flag for a reading: `temperature < min || temperature > max`.
pub fn is_alert(temperature: f64, min: f64, max: f64) -> bool {
    breach(temperature, min, max).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_band_is_not_alert() {
        assert!(!is_alert(5.0, 0.0, 10.0));
        assert_eq!(breach(5.0, 0.0, 10.0), None);
    }

    #[test]
    fn boundary_values_are_not_alerts() {
        // Strict inequality only: exactly at a bound is inside the band.
        assert!(!is_alert(0.0, 0.0, 10.0));
        assert!(!is_alert(10.0, 0.0, 10.0));
    }

    #[test]
    fn above_max_is_alert() {
        assert_eq!(breach(10.1, 0.0, 10.0), Some(Breach::AboveMax));
        assert!(is_alert(15.0, 0.0, 10.0));
    }

    #[test]
    fn below_min_is_alert() {
        assert_eq!(breach(-0.5, 0.0, 10.0), Some(Breach::BelowMin));
        assert!(is_alert(-20.0, 0.0, 10.0));
    }

    #[test]
    fn negative_band() {
        assert!(!is_alert(-20.0, -25.0, -15.0));
        assert_eq!(breach(-30.0, -25.0, -15.0), Some(Breach::BelowMin));
        assert_eq!(breach(-10.0, -25.0, -15.0), Some(Breach::AboveMax));
    }
}
