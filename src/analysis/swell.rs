//! Swell rater (ocean only).
//!
//! Combines three ceilings: one from period, one from height, and a
//! one-step penalty for a conflicting secondary swell. The final rating is
//! the most restrictive of them.

use crate::analysis::{FactorKind, FactorOutcome, FactorRating};
use crate::model::{BreakType, Rating, Swell};
use crate::units;

/// Secondary swells at least this fraction of the primary height matter.
const SECONDARY_SIGNIFICANCE: f64 = 0.5;
/// Directions further apart than this are treated as conflicting.
const CONFLICTING_DIRECTION_DEG: f64 = 45.0;
const CLOSEOUT_HEIGHT_FT: f64 = 6.0;

/// (period seconds, face-height multiplier). Linear between knots, flat
/// outside them.
const PERIOD_MULTIPLIER_KNOTS: [(f64, f64); 6] = [
    (6.0, 0.5),
    (11.0, 1.0),
    (12.0, 1.0),
    (14.0, 1.2),
    (19.0, 1.6),
    (20.0, 2.0),
];

/// Multiplier applied to swell height to estimate breaking wave height.
/// Non-decreasing in period.
pub fn period_multiplier(period_s: f64) -> f64 {
    let (first_p, first_m) = PERIOD_MULTIPLIER_KNOTS[0];
    if period_s <= first_p {
        return first_m;
    }
    for pair in PERIOD_MULTIPLIER_KNOTS.windows(2) {
        let (p0, m0) = pair[0];
        let (p1, m1) = pair[1];
        if period_s <= p1 {
            return m0 + (m1 - m0) * (period_s - p0) / (p1 - p0);
        }
    }
    PERIOD_MULTIPLIER_KNOTS[PERIOD_MULTIPLIER_KNOTS.len() - 1].1
}

/// Estimated breaking wave height in feet, rounded to 0.1.
pub fn estimated_wave_height(height_ft: f64, period_s: f64) -> f64 {
    (height_ft * period_multiplier(period_s) * 10.0).round() / 10.0
}

/// Best rating a swell of this period can reach.
pub fn period_cap(period_s: f64) -> Rating {
    if period_s < 7.0 {
        Rating::Poor
    } else if period_s <= 10.0 {
        Rating::Fair
    } else if period_s <= 13.0 {
        Rating::Good
    } else {
        Rating::Epic
    }
}

/// Best rating a swell of this height can reach.
pub fn height_cap(height_ft: f64) -> Rating {
    if height_ft < 1.0 {
        Rating::Poor
    } else if height_ft <= 2.0 {
        Rating::Fair
    } else if height_ft <= 4.0 {
        Rating::Good
    } else {
        Rating::Epic
    }
}

/// Whether a secondary swell is big enough and far enough off-angle to
/// cross up the primary.
pub fn secondary_conflicts(primary: &Swell, secondary: &Swell) -> bool {
    primary.height_ft > 0.0
        && secondary.height_ft >= primary.height_ft * SECONDARY_SIGNIFICANCE
        && units::angular_difference(primary.direction_deg, secondary.direction_deg)
            > CONFLICTING_DIRECTION_DEG
}

pub fn rate_swell(primary: &Swell, secondary: Option<&Swell>, break_type: BreakType) -> FactorRating {
    let by_period = period_cap(primary.period_s);
    let by_height = height_cap(primary.height_ft);
    let mut rating = by_period.cap(by_height);
    let estimate = estimated_wave_height(primary.height_ft, primary.period_s);

    let mut notes = vec![format!(
        "{:.1} ft @ {:.0} s from {} (est. {:.1} ft faces).",
        primary.height_ft,
        primary.period_s,
        units::degrees_to_compass(primary.direction_deg),
        estimate
    )];
    if by_period < by_height {
        notes.push(format!("Period of {:.0} s limits quality to {}.", primary.period_s, by_period));
    } else if by_height < by_period {
        notes.push(format!("Height of {:.1} ft limits quality to {}.", primary.height_ft, by_height));
    }

    if let Some(secondary) = secondary {
        if secondary_conflicts(primary, secondary) {
            rating = rating.lowered();
            notes.push(format!(
                "Conflicting {:.1} ft secondary swell from {} will cross up the lineup.",
                secondary.height_ft,
                units::degrees_to_compass(secondary.direction_deg)
            ));
        } else if secondary.height_ft >= primary.height_ft * SECONDARY_SIGNIFICANCE {
            notes.push(format!(
                "{:.1} ft secondary swell from a similar direction adds consistency.",
                secondary.height_ft
            ));
        }
    }

    if break_type == BreakType::Beach && estimate > CLOSEOUT_HEIGHT_FT {
        notes.push("Large surf for a beach break; expect closeouts on the outer bars.".to_string());
    }

    FactorRating {
        kind: FactorKind::Swell,
        outcome: FactorOutcome::Rated(rating),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn swell(height_ft: f64, period_s: f64, direction_deg: f64) -> Swell {
        Swell {
            height_ft,
            period_s,
            direction_deg,
        }
    }

    #[test]
    fn test_multiplier_brackets() {
        assert!(period_multiplier(9.0) < 1.0, "short period shrinks the estimate");
        assert_relative_eq!(period_multiplier(11.5), 1.0);
        assert!(period_multiplier(16.0) > 1.0);
        assert_relative_eq!(period_multiplier(21.0), 2.0);
        assert_relative_eq!(period_multiplier(3.0), 0.5);
    }

    #[test]
    fn test_multiplier_is_monotonic() {
        let mut previous = period_multiplier(0.0);
        for tenth in 1..300 {
            let current = period_multiplier(tenth as f64 / 10.0);
            assert!(current >= previous, "dropped at {} s", tenth as f64 / 10.0);
            previous = current;
        }
    }

    #[test]
    fn test_period_cap_monotonic_and_banded() {
        assert_eq!(period_cap(6.9), Rating::Poor);
        assert_eq!(period_cap(7.0), Rating::Fair);
        assert_eq!(period_cap(10.0), Rating::Fair);
        assert_eq!(period_cap(10.1), Rating::Good);
        assert_eq!(period_cap(13.0), Rating::Good);
        assert_eq!(period_cap(13.1), Rating::Epic);

        let mut previous = period_cap(0.0);
        for tenth in 0..250 {
            let current = period_cap(tenth as f64 / 10.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_height_cap_bands() {
        assert_eq!(height_cap(0.9), Rating::Poor);
        assert_eq!(height_cap(1.0), Rating::Fair);
        assert_eq!(height_cap(2.0), Rating::Fair);
        assert_eq!(height_cap(3.0), Rating::Good);
        assert_eq!(height_cap(5.0), Rating::Epic);
    }

    #[test]
    fn test_rating_is_most_restrictive_cap() {
        let rated = rate_swell(&swell(6.0, 8.0, 270.0), None, BreakType::Reef);
        assert_eq!(rated.rating(), Some(Rating::Fair));
        let rated = rate_swell(&swell(3.0, 15.0, 270.0), None, BreakType::Reef);
        assert_eq!(rated.rating(), Some(Rating::Good));
    }

    #[test]
    fn test_conflicting_secondary_lowers_one_step() {
        let primary = swell(5.0, 15.0, 270.0);
        let crossing = swell(3.0, 10.0, 180.0);
        let rated = rate_swell(&primary, Some(&crossing), BreakType::Reef);
        assert_eq!(rated.rating(), Some(Rating::Good));

        let aligned = swell(3.0, 10.0, 285.0);
        let rated = rate_swell(&primary, Some(&aligned), BreakType::Reef);
        assert_eq!(rated.rating(), Some(Rating::Epic));
    }

    #[test]
    fn test_small_secondary_is_ignored() {
        let primary = swell(5.0, 15.0, 270.0);
        assert!(!secondary_conflicts(&primary, &swell(2.0, 9.0, 90.0)));
    }

    #[test]
    fn test_conflict_penalty_saturates_at_poor() {
        let rated = rate_swell(&swell(0.5, 6.0, 270.0), Some(&swell(0.5, 6.0, 90.0)), BreakType::Beach);
        assert_eq!(rated.rating(), Some(Rating::Poor));
    }

    #[test]
    fn test_closeout_note_on_big_beach_surf() {
        let rated = rate_swell(&swell(6.0, 16.0, 270.0), None, BreakType::Beach);
        assert!(rated.notes.iter().any(|n| n.contains("closeouts")));
        let rated = rate_swell(&swell(6.0, 16.0, 270.0), None, BreakType::Point);
        assert!(!rated.notes.iter().any(|n| n.contains("closeouts")));
    }
}
