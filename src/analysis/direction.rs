//! Swell direction fit against the spot's facing (ocean only).

use crate::analysis::{FactorKind, FactorRating};
use crate::model::{BreakType, Rating};
use crate::units;

/// Rates how squarely a swell from `swell_from_deg` hits a coast facing
/// `facing_deg`.
///
/// | difference | rating                                 |
/// |------------|----------------------------------------|
/// | ≤ 15°      | Epic                                   |
/// | ≤ 30°      | Good                                   |
/// | ≤ 60°      | Fair, Good at point and reef breaks    |
/// | ≤ 90°      | Fair                                   |
/// | > 90°      | Poor                                   |
pub fn rate_direction(swell_from_deg: f64, facing_deg: f64, break_type: BreakType) -> FactorRating {
    let diff = units::angular_difference(swell_from_deg, facing_deg);
    let from = units::degrees_to_compass(swell_from_deg);

    let (rating, note) = if diff <= 15.0 {
        (Rating::Epic, format!("{} swell is aimed straight at the spot ({:.0}° off).", from, diff))
    } else if diff <= 30.0 {
        (Rating::Good, format!("{} swell is well aligned ({:.0}° off).", from, diff))
    } else if diff <= 60.0 {
        match break_type {
            BreakType::Point | BreakType::Reef => (
                Rating::Good,
                format!(
                    "{} swell arrives angled ({:.0}° off); oblique swell peels well along a {}.",
                    from, diff, break_type
                ),
            ),
            BreakType::Beach => (
                Rating::Fair,
                format!("{} swell arrives angled ({:.0}° off).", from, diff),
            ),
        }
    } else if diff <= 90.0 {
        (
            Rating::Fair,
            format!("{} swell is partly shadowed ({:.0}° off).", from, diff),
        )
    } else {
        (
            Rating::Poor,
            format!("{} swell is shadowed by the coast ({:.0}° off).", from, diff),
        )
    };

    FactorRating::rated(FactorKind::Direction, rating).with_note(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(swell: f64, facing: f64, break_type: BreakType) -> Rating {
        rate_direction(swell, facing, break_type).rating().unwrap()
    }

    #[test]
    fn test_head_on_swell_is_epic() {
        assert_eq!(rating(247.5, 247.5, BreakType::Beach), Rating::Epic);
        assert_eq!(rating(355.0, 5.0, BreakType::Beach), Rating::Epic, "wraps at north");
    }

    #[test]
    fn test_boundaries_fall_to_lower_band() {
        assert_eq!(rating(30.0, 0.0, BreakType::Beach), Rating::Good);
        assert_eq!(rating(31.0, 0.0, BreakType::Beach), Rating::Fair);
        assert_eq!(rating(60.0, 0.0, BreakType::Beach), Rating::Fair);
    }

    #[test]
    fn test_point_break_lifts_angled_swell() {
        assert_eq!(rating(225.0, 270.0, BreakType::Point), Rating::Good);
        assert_eq!(rating(225.0, 270.0, BreakType::Beach), Rating::Fair);
    }

    #[test]
    fn test_shadowed_swell_never_lifted_above_fair() {
        for break_type in [BreakType::Beach, BreakType::Reef, BreakType::Point] {
            for diff in [61.0, 75.0, 90.0, 120.0, 180.0] {
                assert!(rating(diff, 0.0, break_type) <= Rating::Fair);
            }
        }
    }
}
