//! Tide rater (ocean only).
//!
//! Predictions are high/low events only, so the level between them is
//! reconstructed with a half-cosine, which matches the shape of a
//! semidiurnal tide far better than a straight line.

use std::f64::consts::PI;
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::analysis::{FactorKind, FactorRating};
use crate::model::{Rating, TideKind, TidePrediction, TideSeries};
use crate::spots::TidalPreference;

/// High-to-low swings at or above this produce strong currents.
const STRONG_SWING_FT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TideStage {
    Low,
    MidRising,
    MidFalling,
    High,
}

impl fmt::Display for TideStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideStage::Low => write!(f, "low"),
            TideStage::MidRising => write!(f, "mid, rising"),
            TideStage::MidFalling => write!(f, "mid, falling"),
            TideStage::High => write!(f, "high"),
        }
    }
}

/// Interpolated tide state between two predicted events.
#[derive(Debug, Clone, PartialEq)]
pub struct TideLevel {
    pub height_ft: f64,
    /// 0.0 at the cycle's low, 1.0 at its high.
    pub fraction: f64,
    pub rising: bool,
    pub previous: TidePrediction,
    pub next: TidePrediction,
}

impl TideLevel {
    pub fn stage(&self) -> TideStage {
        if self.fraction <= 1.0 / 3.0 {
            TideStage::Low
        } else if self.fraction >= 2.0 / 3.0 {
            TideStage::High
        } else if self.rising {
            TideStage::MidRising
        } else {
            TideStage::MidFalling
        }
    }

    pub fn swing_ft(&self) -> f64 {
        (self.next.height_ft - self.previous.height_ft).abs()
    }
}

/// Tide level at `at`, or `None` outside the span of the series.
pub fn interpolate(series: &TideSeries, at: DateTime<Utc>) -> Option<TideLevel> {
    let pair = series
        .predictions
        .windows(2)
        .find(|pair| pair[0].time <= at && at <= pair[1].time)?;
    let (previous, next) = (&pair[0], &pair[1]);

    let span = (next.time - previous.time).num_seconds() as f64;
    let progress = if span > 0.0 {
        (at - previous.time).num_seconds() as f64 / span
    } else {
        0.0
    };
    let blend = (1.0 - (PI * progress).cos()) / 2.0;
    let height_ft = previous.height_ft + (next.height_ft - previous.height_ft) * blend;

    let low = previous.height_ft.min(next.height_ft);
    let high = previous.height_ft.max(next.height_ft);
    let fraction = if high > low {
        (height_ft - low) / (high - low)
    } else {
        0.5
    };

    Some(TideLevel {
        height_ft,
        fraction,
        rising: next.height_ft > previous.height_ft,
        previous: previous.clone(),
        next: next.clone(),
    })
}

/// Lowest predicted event within `window` of `at`.
pub fn min_tide_near(series: &TideSeries, at: DateTime<Utc>, window: Duration) -> Option<f64> {
    series
        .predictions
        .iter()
        .filter(|p| (p.time - at).abs() <= window)
        .map(|p| p.height_ft)
        .reduce(f64::min)
}

fn event_label(event: &TidePrediction, offset: FixedOffset) -> String {
    let kind = match event.kind {
        TideKind::High => "high",
        TideKind::Low => "low",
    };
    format!(
        "{:.1} ft {} at {}",
        event.height_ft,
        kind,
        event.time.with_timezone(&offset).format("%H:%M")
    )
}

/// Low → Good (sharp, hollow), mid rising → Epic, mid falling → Good,
/// high → Fair (fat, slow). A level outside the spot's preferred range
/// costs one step.
pub fn rate_tide(
    series: &TideSeries,
    at: DateTime<Utc>,
    preference: &TidalPreference,
    offset: FixedOffset,
) -> FactorRating {
    let Some(level) = interpolate(series, at) else {
        return FactorRating::not_rated(
            FactorKind::Tide,
            "session falls outside the tide prediction window",
        );
    };

    let stage = level.stage();
    let mut rating = match stage {
        TideStage::Low => Rating::Good,
        TideStage::MidRising => Rating::Epic,
        TideStage::MidFalling => Rating::Good,
        TideStage::High => Rating::Fair,
    };

    let mut factor = FactorRating::rated(FactorKind::Tide, rating).with_note(format!(
        "{:.1} ft and {} toward the {}.",
        level.height_ft,
        stage,
        event_label(&level.next, offset)
    ));

    if !preference.contains(level.height_ft) {
        rating = rating.lowered();
        factor = factor
            .map_rating(|_| rating)
            .with_note("Tide is outside the range this spot prefers.");
    }
    if level.swing_ft() >= STRONG_SWING_FT {
        factor = factor.with_note(format!(
            "Large {:.1} ft tidal swing: expect strong currents.",
            level.swing_ft()
        ));
    }
    factor
}
