//! Core data types for the surf report service.
//!
//! This module defines the shared domain model imported by all other
//! modules: spot classification enums, the four-level `Rating`, the
//! normalized shapes of every upstream feed, and the crate error type.
//! It contains no I/O. Absent measurements are always `None`, never a
//! sentinel value; zero is a valid measurement.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::logging::DataSource;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// Four-level condition rating, totally ordered `Poor < Fair < Good < Epic`.
///
/// All capping logic relies on this ordering: `cap(a, b) == min(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Epic,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Poor, Rating::Fair, Rating::Good, Rating::Epic];

    /// Limits this rating to at most `ceiling`.
    pub fn cap(self, ceiling: Rating) -> Rating {
        self.min(ceiling)
    }

    /// Raises this rating to at least `floor`.
    pub fn floor(self, floor: Rating) -> Rating {
        self.max(floor)
    }

    /// One step down, saturating at `Poor`.
    pub fn lowered(self) -> Rating {
        Rating::from_score(self.score().saturating_sub(1))
    }

    pub fn score(self) -> u8 {
        match self {
            Rating::Poor => 0,
            Rating::Fair => 1,
            Rating::Good => 2,
            Rating::Epic => 3,
        }
    }

    /// Inverse of `score`; values above 3 clamp to `Epic`.
    pub fn from_score(score: u8) -> Rating {
        match score {
            0 => Rating::Poor,
            1 => Rating::Fair,
            2 => Rating::Good,
            _ => Rating::Epic,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Poor => write!(f, "Poor"),
            Rating::Fair => write!(f, "Fair"),
            Rating::Good => write!(f, "Good"),
            Rating::Epic => write!(f, "Epic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spot classification
// ---------------------------------------------------------------------------

/// Body of water a spot sits on. Selects the evaluation regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpotType {
    Ocean,
    Lake,
}

impl FromStr for SpotType {
    type Err = SurfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocean" => Ok(SpotType::Ocean),
            "lake" => Ok(SpotType::Lake),
            other => Err(SurfError::Invalid(format!("unknown spot_type '{}'", other))),
        }
    }
}

impl fmt::Display for SpotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpotType::Ocean => write!(f, "ocean"),
            SpotType::Lake => write!(f, "lake"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakType {
    Beach,
    Reef,
    Point,
}

impl FromStr for BreakType {
    type Err = SurfError;

    /// Accepts both `beach` and `beach break` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.trim_end_matches(" break") {
            "beach" => Ok(BreakType::Beach),
            "reef" => Ok(BreakType::Reef),
            "point" => Ok(BreakType::Point),
            _ => Err(SurfError::Invalid(format!("unknown break_type '{}'", s.trim()))),
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakType::Beach => write!(f, "beach break"),
            BreakType::Reef => write!(f, "reef break"),
            BreakType::Point => write!(f, "point break"),
        }
    }
}

/// NDBC station class. Shore (C-MAN) stations report wind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuoyKind {
    Offshore,
    Shore,
}

impl FromStr for BuoyKind {
    type Err = SurfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offshore" => Ok(BuoyKind::Offshore),
            "shore" => Ok(BuoyKind::Shore),
            other => Err(SurfError::Invalid(format!("unknown buoy_kind '{}'", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Forecast types
// ---------------------------------------------------------------------------

/// One swell train (or the combined sea state). Height in feet, period in
/// seconds, direction in degrees true the waves come FROM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Swell {
    pub height_ft: f64,
    pub period_s: f64,
    pub direction_deg: f64,
}

/// Wind speed in mph and the direction it blows FROM, when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Wind {
    pub speed_mph: f64,
    pub from_deg: Option<f64>,
}

/// One hourly marine forecast sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub time: DateTime<Utc>,
    pub primary_swell: Option<Swell>,
    pub secondary_swell: Option<Swell>,
    /// Combined significant sea (swell + wind waves).
    pub sea: Option<Swell>,
    pub wind: Option<Wind>,
    pub sea_level_ft: Option<f64>,
}

/// Hourly forecast samples, time-ascending, plus the spot's local offset.
#[derive(Debug, Clone, PartialEq)]
pub struct MarineForecast {
    pub utc_offset: FixedOffset,
    pub samples: Vec<ForecastSample>,
}

// ---------------------------------------------------------------------------
// Buoy types
// ---------------------------------------------------------------------------

/// Wave fields of a buoy observation. Shore stations structurally lack
/// them, which is distinct from a measured-but-missing field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BuoyWaves {
    Measured {
        height_ft: Option<f64>,
        dominant_period_s: Option<f64>,
        mean_direction_deg: Option<f64>,
    },
    NotApplicable,
}

/// Most recent usable NDBC observation. Speeds in mph, heights in feet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuoyObservation {
    pub station_id: String,
    pub kind: BuoyKind,
    pub observed_at: DateTime<Utc>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub gust_mph: Option<f64>,
    pub waves: BuoyWaves,
    pub water_temp_c: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tide types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TideKind {
    High,
    Low,
}

/// A single predicted high or low tide, height in feet relative to MLLW.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidePrediction {
    pub time: DateTime<Utc>,
    pub height_ft: f64,
    pub kind: TideKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TideSeries {
    pub station_id: String,
    /// Time-ascending.
    pub predictions: Vec<TidePrediction>,
}

// ---------------------------------------------------------------------------
// Alert and weather types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AlertEvent {
    GaleWarning,
    StormWarning,
    SmallCraftAdvisory,
    HighSurfAdvisory,
    HurricaneForceWind,
    Other(String),
}

impl AlertEvent {
    /// Maps an NWS event name onto a category.
    pub fn classify(event: &str) -> AlertEvent {
        let lower = event.trim().to_ascii_lowercase();
        if lower.starts_with("gale") {
            AlertEvent::GaleWarning
        } else if lower.starts_with("storm") {
            AlertEvent::StormWarning
        } else if lower.starts_with("small craft") {
            AlertEvent::SmallCraftAdvisory
        } else if lower.starts_with("high surf") {
            AlertEvent::HighSurfAdvisory
        } else if lower.starts_with("hurricane") {
            AlertEvent::HurricaneForceWind
        } else {
            AlertEvent::Other(event.trim().to_string())
        }
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertEvent::GaleWarning => write!(f, "Gale Warning"),
            AlertEvent::StormWarning => write!(f, "Storm Warning"),
            AlertEvent::SmallCraftAdvisory => write!(f, "Small Craft Advisory"),
            AlertEvent::HighSurfAdvisory => write!(f, "High Surf Advisory"),
            AlertEvent::HurricaneForceWind => write!(f, "Hurricane Force Wind Warning"),
            AlertEvent::Other(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl AlertSeverity {
    pub fn parse(s: &str) -> AlertSeverity {
        match s.trim().to_ascii_lowercase().as_str() {
            "extreme" => AlertSeverity::Extreme,
            "severe" => AlertSeverity::Severe,
            "moderate" => AlertSeverity::Moderate,
            "minor" => AlertSeverity::Minor,
            _ => AlertSeverity::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub event: AlertEvent,
    pub severity: AlertSeverity,
    pub headline: String,
    pub description: String,
    pub effective: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
}

impl Alert {
    /// An alert with no expiry is treated as active.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.expires.is_none_or(|expires| expires >= at)
    }
}

/// One NWS gridded forecast period (typically 12 hours).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPeriod {
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub temperature_f: i32,
    pub wind_speed: String,
    pub wind_direction: String,
    pub short_forecast: String,
}

// ---------------------------------------------------------------------------
// Feed envelope
// ---------------------------------------------------------------------------

/// Outcome of fetching one upstream feed.
///
/// `NotApplicable` (no station configured, tides on a lake) is a normal
/// state and is never reported as a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Feed<T> {
    Available(T),
    NotApplicable(String),
    Unavailable(SurfError),
}

impl<T> Feed<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Feed::Available(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<T, SurfError>> for Feed<T> {
    fn from(result: Result<T, SurfError>) -> Self {
        match result {
            Ok(value) => Feed::Available(value),
            Err(err) => Feed::Unavailable(err),
        }
    }
}

/// Everything fetched for one spot, joined before normalization.
#[derive(Debug, Clone)]
pub struct RawFeeds {
    pub marine: Feed<MarineForecast>,
    pub buoy: Feed<BuoyObservation>,
    pub tides: Feed<TideSeries>,
    pub alerts: Feed<Vec<Alert>>,
    pub weather: Feed<Vec<WeatherPeriod>>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the registry, the adapters and the evaluation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfError {
    /// No spot matches the requested name.
    #[error("could not find a spot named '{0}'")]
    NotFound(String),
    /// A source fetch failed or returned an unusable payload.
    #[error("{feed} unavailable: {message}")]
    UpstreamUnavailable { feed: DataSource, message: String },
    /// The fetch succeeded but lacked the fields a rating needs.
    #[error("insufficient data for {spot}: {detail}")]
    InsufficientData { spot: String, detail: String },
    /// Malformed spot configuration or service setting.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl SurfError {
    pub fn upstream(feed: DataSource, message: impl Into<String>) -> SurfError {
        SurfError::UpstreamUnavailable {
            feed,
            message: message.into(),
        }
    }

    /// `NotFound` and `Invalid` abort the whole request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SurfError::NotFound(_) | SurfError::Invalid(_))
    }
}
