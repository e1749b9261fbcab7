/// Surf condition evaluation engine.
///
/// Everything under this module is pure: it takes already-fetched feeds
/// and returns a [`SessionReport`]. No I/O, no clocks (the caller passes
/// `now`), no shared state, so spots can be evaluated concurrently.
///
/// Submodules:
/// - `normalize`: picks the forecast sample and reduces raw feeds to signals.
/// - `regime`: ocean/lake dispatch.
/// - `swell`, `direction`, `wind`, `tide`: ocean factor raters.
/// - `lake`: lake factor raters and rules.
/// - `ocean`: ocean factor assembly and overrides.
/// - `crosscheck`: buoy vs forecast validation.
/// - `summary`: overall rating, best window, outlook and the report type.
pub mod crosscheck;
pub mod direction;
pub mod lake;
pub mod normalize;
pub mod ocean;
pub mod regime;
pub mod summary;
pub mod swell;
pub mod tide;
pub mod wind;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logging::{self, DataSource};
use crate::model::{RawFeeds, Rating, SurfError};
use crate::spots::Spot;

use normalize::{EvaluationTarget, NormalizeOptions, NormalizedSignals};
use regime::Regime;
use summary::SessionReport;

// ---------------------------------------------------------------------------
// Factor ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FactorKind {
    Swell,
    Direction,
    Wind,
    Tide,
    Waves,
    MarineAlerts,
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorKind::Swell => write!(f, "Swell"),
            FactorKind::Direction => write!(f, "Direction"),
            FactorKind::Wind => write!(f, "Wind"),
            FactorKind::Tide => write!(f, "Tide"),
            FactorKind::Waves => write!(f, "Waves"),
            FactorKind::MarineAlerts => write!(f, "Marine Alerts"),
        }
    }
}

/// A factor either has a rating or says why it could not be rated.
/// Missing inputs are never rated as worst case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FactorOutcome {
    Rated(Rating),
    NotRated(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRating {
    pub kind: FactorKind,
    pub outcome: FactorOutcome,
    pub notes: Vec<String>,
}

impl FactorRating {
    pub fn rated(kind: FactorKind, rating: Rating) -> FactorRating {
        FactorRating {
            kind,
            outcome: FactorOutcome::Rated(rating),
            notes: Vec::new(),
        }
    }

    pub fn not_rated(kind: FactorKind, reason: impl Into<String>) -> FactorRating {
        FactorRating {
            kind,
            outcome: FactorOutcome::NotRated(reason.into()),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> FactorRating {
        self.notes.push(note.into());
        self
    }

    pub fn rating(&self) -> Option<Rating> {
        match self.outcome {
            FactorOutcome::Rated(rating) => Some(rating),
            FactorOutcome::NotRated(_) => None,
        }
    }

    /// Replaces the rating, keeping notes. No-op on an unrated factor.
    pub fn map_rating(mut self, f: impl FnOnce(Rating) -> Rating) -> FactorRating {
        if let FactorOutcome::Rated(rating) = self.outcome {
            self.outcome = FactorOutcome::Rated(f(rating));
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Evaluates one spot from normalized signals, dispatching on its regime.
pub fn evaluate(spot: &Spot, signals: &NormalizedSignals) -> Result<SessionReport, SurfError> {
    let regime = Regime::of(spot);
    let assessment = match regime {
        Regime::Ocean => ocean::assess(spot, signals)?,
        Regime::Lake => lake::assess(spot, signals)?,
    };
    let report = summary::summarize(spot, regime, signals, assessment);

    logging::info(
        DataSource::Engine,
        Some(&spot.name),
        &format!(
            "{} regime, overall {} ({} overrides fired)",
            regime,
            report.overall,
            report.overrides.len()
        ),
    );
    Ok(report)
}

/// Normalizes raw feeds, then evaluates.
pub fn evaluate_feeds(
    spot: &Spot,
    feeds: RawFeeds,
    target: EvaluationTarget,
    now: DateTime<Utc>,
    options: &NormalizeOptions,
) -> Result<SessionReport, SurfError> {
    let signals = normalize::normalize(spot, feeds, target, now, options);
    evaluate(spot, &signals)
}
