//! Unit conversions and circular direction helpers.
//!
//! Directions are degrees true in `[0, 360)`. All conversions round to
//! one decimal place, matching the precision of the upstream feeds.

pub const FEET_PER_METER: f64 = 3.28084;
pub const MPH_PER_METER_PER_SEC: f64 = 2.23694;

/// 16-point compass rose, clockwise from north.
const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
    "NW", "NNW",
];

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn meters_to_feet(meters: f64) -> f64 {
    round_tenth(meters * FEET_PER_METER)
}

pub fn mps_to_mph(mps: f64) -> f64 {
    round_tenth(mps * MPH_PER_METER_PER_SEC)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Wraps any angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Smallest absolute angle between two bearings, in `[0, 180]`.
///
/// Accounts for wraparound: 350° and 10° are 20° apart.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Resolves a compass point such as `WSW` to degrees (247.5).
pub fn compass_to_degrees(point: &str) -> Option<f64> {
    let upper = point.trim().to_ascii_uppercase();
    COMPASS_POINTS
        .iter()
        .position(|p| *p == upper)
        .map(|idx| idx as f64 * 22.5)
}

/// Nearest 16-point compass label for a bearing.
pub fn degrees_to_compass(deg: f64) -> &'static str {
    let idx = (normalize_degrees(deg) / 22.5).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[idx]
}

/// Accepts either a compass point or a numeric bearing.
pub fn parse_bearing(raw: &str) -> Option<f64> {
    compass_to_degrees(raw).or_else(|| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|deg| deg.is_finite())
            .map(normalize_degrees)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_meters_to_feet_rounds_to_tenth() {
        assert_relative_eq!(meters_to_feet(1.0), 3.3);
        assert_relative_eq!(meters_to_feet(0.0), 0.0);
        assert_relative_eq!(meters_to_feet(2.5), 8.2);
    }

    #[test]
    fn test_speed_conversions() {
        assert_relative_eq!(mps_to_mph(10.0), 22.4);
    }

    #[test]
    fn test_angular_difference_wraps() {
        assert_relative_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_relative_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_relative_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_relative_eq!(angular_difference(270.0, 90.0), 180.0);
        assert_relative_eq!(angular_difference(247.5, 247.5), 0.0);
        assert_relative_eq!(angular_difference(-30.0, 30.0), 60.0);
    }

    #[test]
    fn test_angular_difference_is_bounded_and_symmetric() {
        for a in (0..360).step_by(15) {
            for b in (0..360).step_by(15) {
                let d = angular_difference(a as f64, b as f64);
                assert!((0.0..=180.0).contains(&d));
                assert_relative_eq!(d, angular_difference(b as f64, a as f64));
            }
        }
    }

    #[test]
    fn test_compass_round_trip_on_points() {
        assert_eq!(compass_to_degrees("WSW"), Some(247.5));
        assert_eq!(compass_to_degrees("sse"), Some(157.5));
        assert_eq!(compass_to_degrees("N"), Some(0.0));
        assert_eq!(compass_to_degrees("NORTHISH"), None);
        assert_eq!(degrees_to_compass(247.5), "WSW");
        assert_eq!(degrees_to_compass(359.0), "N");
    }

    #[test]
    fn test_parse_bearing_accepts_numbers() {
        assert_eq!(parse_bearing("225"), Some(225.0));
        assert_eq!(parse_bearing("370"), Some(10.0));
        assert_eq!(parse_bearing("SW"), Some(225.0));
        assert_eq!(parse_bearing("sideways"), None);
    }
}
