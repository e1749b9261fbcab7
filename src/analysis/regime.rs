//! Ocean/lake regime selection.
//!
//! The two regimes invert the meaning of wind (hazard vs. wave source) and
//! of tide (primary factor vs. ignored), so each has its own rule set and
//! the choice is made once per evaluation.

use std::fmt;

use serde::Serialize;

use crate::model::{SpotType, SurfError};
use crate::spots::Spot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Regime {
    Ocean,
    Lake,
}

impl Regime {
    pub fn for_spot_type(spot_type: SpotType) -> Regime {
        match spot_type {
            SpotType::Ocean => Regime::Ocean,
            SpotType::Lake => Regime::Lake,
        }
    }

    pub fn of(spot: &Spot) -> Regime {
        Regime::for_spot_type(spot.spot_type)
    }

    /// Selects a regime from a raw `spot_type` string. Unknown types are
    /// `Invalid`, never defaulted.
    pub fn select(raw_spot_type: &str) -> Result<Regime, SurfError> {
        raw_spot_type.parse::<SpotType>().map(Regime::for_spot_type)
    }

    /// Whether the tide factor belongs to this regime at all.
    pub fn rates_tide(self) -> bool {
        matches!(self, Regime::Ocean)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Ocean => write!(f, "ocean"),
            Regime::Lake => write!(f, "lake"),
        }
    }
}
