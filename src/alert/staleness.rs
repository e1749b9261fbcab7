//! Buoy observation staleness detection.
//!
//! NDBC stations report every 10 to 60 minutes. A station that has gone
//! quiet keeps serving its last row, and that row says nothing about the
//! surf hours later. Readings older than the configured age are dropped
//! from cross-validation and wind fallback.
//!
//! # Clock injection
//! All functions accept the reference instant rather than calling
//! `Utc::now()` internally, so staleness is deterministic in tests. The
//! reference is normally the evaluation time, which may lie in the future
//! when a later session is requested.

use chrono::{DateTime, Utc};

use crate::model::BuoyObservation;

/// Minutes between the observation and `reference`, in either direction.
pub fn observation_age_minutes(observed_at: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    (reference - observed_at).num_minutes().abs()
}

/// Returns `true` if the observation is more than `max_age_minutes` away
/// from `reference`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
pub fn is_stale_at(
    observation: &BuoyObservation,
    max_age_minutes: u64,
    reference: DateTime<Utc>,
) -> bool {
    let age = observation_age_minutes(observation.observed_at, reference);
    age as u64 > max_age_minutes
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(observation: &BuoyObservation, max_age_minutes: u64) -> bool {
    is_stale_at(observation, max_age_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuoyKind, BuoyWaves};
    use chrono::TimeZone;

    fn observation_at(observed_at: DateTime<Utc>) -> BuoyObservation {
        BuoyObservation {
            station_id: "46086".to_string(),
            kind: BuoyKind::Offshore,
            observed_at,
            wind_speed_mph: Some(8.9),
            wind_direction_deg: Some(290.0),
            gust_mph: Some(11.2),
            waves: BuoyWaves::Measured {
                height_ft: Some(4.3),
                dominant_period_s: Some(13.0),
                mean_direction_deg: Some(275.0),
            },
            water_temp_c: Some(16.4),
        }
    }

    /// A fixed reference used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    // --- Not stale ----------------------------------------------------------

    #[test]
    fn test_observation_20_minutes_old_is_not_stale() {
        let obs = observation_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 40, 0).unwrap());
        assert!(!is_stale_at(&obs, 180, fixed_now()));
    }

    #[test]
    fn test_observation_exactly_at_threshold_is_not_stale() {
        // 180 minutes old with a 180 minute threshold.
        let obs = observation_at(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert!(
            !is_stale_at(&obs, 180, fixed_now()),
            "staleness is strictly greater than, not >="
        );
    }

    // --- Stale --------------------------------------------------------------

    #[test]
    fn test_observation_one_minute_past_threshold_is_stale() {
        let obs = observation_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 59, 0).unwrap());
        assert!(is_stale_at(&obs, 180, fixed_now()));
    }

    #[test]
    fn test_future_session_makes_current_observation_stale() {
        // Evaluating tomorrow morning: today's reading is a day away.
        let obs = observation_at(fixed_now());
        let tomorrow = Utc.with_ymd_and_hms(2024, 5, 2, 15, 0, 0).unwrap();
        assert!(is_stale_at(&obs, 180, tomorrow));
        assert_eq!(observation_age_minutes(obs.observed_at, tomorrow), 26 * 60);
    }

    #[test]
    fn test_same_observation_stale_under_tight_threshold_not_under_loose() {
        let obs = observation_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert!(is_stale_at(&obs, 30, fixed_now()));
        assert!(!is_stale_at(&obs, 90, fixed_now()));
    }
}
