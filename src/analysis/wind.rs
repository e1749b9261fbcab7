//! Wind relation to the coast and the ocean wind rater.

use std::fmt;

use serde::Serialize;

use crate::analysis::{FactorKind, FactorOutcome, FactorRating};
use crate::model::{Rating, Wind};
use crate::units;

pub const GLASSY_MPH: f64 = 5.0;
const MODERATE_MPH: f64 = 10.0;
const STRONG_MPH: f64 = 15.0;
const DANGEROUS_MPH: f64 = 20.0;

/// Where the wind blows relative to the beach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindRelation {
    /// From the land toward the water.
    Offshore,
    Cross,
    /// From the water onto the beach.
    Onshore,
}

impl fmt::Display for WindRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindRelation::Offshore => write!(f, "offshore"),
            WindRelation::Cross => write!(f, "cross-shore"),
            WindRelation::Onshore => write!(f, "onshore"),
        }
    }
}

/// A wind coming FROM the direction the beach faces is onshore (≤ 45°);
/// from behind the beach (> 135°) it is offshore.
pub fn classify_relation(wind_from_deg: f64, facing_deg: f64) -> WindRelation {
    let diff = units::angular_difference(wind_from_deg, facing_deg);
    if diff <= 45.0 {
        WindRelation::Onshore
    } else if diff > 135.0 {
        WindRelation::Offshore
    } else {
        WindRelation::Cross
    }
}

/// Ocean wind rating. Light wind is always Epic; otherwise direction sets
/// the base and speed bands pull it down.
///
/// A speed on a band edge belongs to the calmer band.
///
/// | speed (mph) | effect                          |
/// |-------------|---------------------------------|
/// | < 5         | Epic (glassy)                   |
/// | 5 – 10      | direction base                  |
/// | 10 – 15     | one step down                   |
/// | 15 – 20     | one step down, capped at Fair   |
/// | > 20        | Poor                            |
pub fn rate_ocean_wind(wind: &Wind, facing_deg: f64) -> FactorRating {
    let speed = wind.speed_mph;
    if speed < GLASSY_MPH {
        return FactorRating::rated(FactorKind::Wind, Rating::Epic)
            .with_note(format!("{:.0} mph: glassy.", speed));
    }

    let mut notes = Vec::new();
    let relation = match wind.from_deg {
        Some(from) => classify_relation(from, facing_deg),
        None => {
            notes.push("Wind direction unavailable; assuming cross-shore.".to_string());
            WindRelation::Cross
        }
    };
    let base = match relation {
        WindRelation::Offshore => Rating::Epic,
        WindRelation::Cross => Rating::Good,
        WindRelation::Onshore => Rating::Fair,
    };

    let rating = if speed > DANGEROUS_MPH {
        Rating::Poor
    } else if speed > STRONG_MPH {
        base.lowered().cap(Rating::Fair)
    } else if speed > MODERATE_MPH {
        base.lowered()
    } else {
        base
    };

    let label = match wind.from_deg {
        Some(from) => format!("{:.0} mph {} from {}", speed, relation, units::degrees_to_compass(from)),
        None => format!("{:.0} mph", speed),
    };
    notes.insert(0, format!("{}.", label));
    if speed > DANGEROUS_MPH {
        notes.push("Too strong to surf safely in any direction.".to_string());
    } else if speed > STRONG_MPH {
        notes.push("Strong wind: faces will be bumpy even if offshore.".to_string());
    }

    FactorRating {
        kind: FactorKind::Wind,
        outcome: FactorOutcome::Rated(rating),
        notes,
    }
}
