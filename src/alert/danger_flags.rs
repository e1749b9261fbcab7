//! Cross-factor override ("danger flag") rules.
//!
//! Each rule is a (predicate, cap, annotation) triple evaluated against an
//! [`OverrideContext`] built after the per-factor ratings. Rules never
//! raise a rating. Every rule that applies fires, and the overall rating
//! is the minimum of the incoming rating and all fired caps, so the order
//! of the rule list does not affect the result.

use serde::Serialize;

use crate::model::{AlertEvent, BreakType, Rating};

/// Signals the rules look at. Missing measurements never satisfy a
/// threshold predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideContext {
    pub break_type: BreakType,
    pub swell_height_ft: Option<f64>,
    pub swell_period_s: Option<f64>,
    pub estimated_surf_ft: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    /// Consecutive hours at or above 15 mph leading up to the session.
    pub sustained_wind_hours: u32,
    pub alerts: Vec<AlertEvent>,
    /// Lowest predicted tide near the session.
    pub min_tide_ft: Option<f64>,
}

impl OverrideContext {
    pub fn new(break_type: BreakType) -> OverrideContext {
        OverrideContext {
            break_type,
            swell_height_ft: None,
            swell_period_s: None,
            estimated_surf_ft: None,
            wind_speed_mph: None,
            sustained_wind_hours: 0,
            alerts: Vec::new(),
            min_tide_ft: None,
        }
    }

    fn wind_above(&self, mph: f64) -> bool {
        self.wind_speed_mph.is_some_and(|w| w > mph)
    }

    fn has_alert(&self, wanted: &[AlertEvent]) -> bool {
        self.alerts.iter().any(|a| wanted.contains(a))
    }
}

pub struct OverrideRule {
    pub name: &'static str,
    pub applies: fn(&OverrideContext) -> bool,
    /// Ceiling for the overall rating; `None` for annotation-only rules.
    pub cap: Option<Rating>,
    pub annotation: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiredOverride {
    pub name: String,
    pub cap: Option<Rating>,
    pub annotation: Option<String>,
}

// ---------------------------------------------------------------------------
// Ocean rules
// ---------------------------------------------------------------------------

pub const OCEAN_RULES: &[OverrideRule] = &[
    OverrideRule {
        name: "Flat",
        applies: |ctx| ctx.swell_height_ft.is_some_and(|h| h < 1.0),
        cap: Some(Rating::Poor),
        annotation: None,
    },
    OverrideRule {
        name: "Small swell",
        applies: |ctx| ctx.swell_height_ft.is_some_and(|h| (1.0..=2.0).contains(&h)),
        cap: Some(Rating::Fair),
        annotation: None,
    },
    OverrideRule {
        name: "Slushy",
        applies: |ctx| ctx.wind_above(15.0) && ctx.swell_period_s.is_some_and(|p| p < 11.0),
        cap: Some(Rating::Fair),
        annotation: Some(
            "Wind over 15 mph on short-period swell: choppy, disorganized surf and rip currents likely.",
        ),
    },
    OverrideRule {
        name: "Dangerous wind",
        applies: |ctx| ctx.wind_above(20.0),
        cap: Some(Rating::Poor),
        annotation: Some(
            "DANGER: wind over 20 mph. Strong rip currents; conditions are unsafe for most surfers.",
        ),
    },
    OverrideRule {
        name: "Beach rip current",
        applies: |ctx| ctx.break_type == BreakType::Beach && ctx.wind_above(15.0),
        cap: None,
        annotation: Some("Beach break with wind over 15 mph: elevated rip current risk."),
    },
    OverrideRule {
        name: "Closeout",
        applies: |ctx| {
            ctx.break_type == BreakType::Beach
                && ctx
                    .estimated_surf_ft
                    .or(ctx.swell_height_ft)
                    .is_some_and(|h| h > 6.0)
        },
        cap: None,
        annotation: Some("Surf above 6 ft at a beach break: expect closeouts and heavy shorebreak."),
    },
    OverrideRule {
        name: "Negative tide",
        applies: |ctx| ctx.break_type == BreakType::Beach && ctx.min_tide_ft.is_some_and(|t| t < 0.0),
        cap: None,
        annotation: Some(
            "Negative tide at a beach break: hollow, unmakeable closeouts and exposed sandbars near low water.",
        ),
    },
    OverrideRule {
        name: "Marine hazard alert",
        applies: |ctx| {
            ctx.has_alert(&[
                AlertEvent::GaleWarning,
                AlertEvent::StormWarning,
                AlertEvent::HighSurfAdvisory,
                AlertEvent::HurricaneForceWind,
            ])
        },
        cap: None,
        annotation: Some("Marine hazard alert in effect: read the NWS statement before paddling out."),
    },
];

// ---------------------------------------------------------------------------
// Lake rules
// ---------------------------------------------------------------------------

pub const LAKE_RULES: &[OverrideRule] = &[
    OverrideRule {
        name: "Calm",
        applies: |ctx| ctx.wind_speed_mph.is_some_and(|w| w < 10.0),
        cap: Some(Rating::Poor),
        annotation: None,
    },
    OverrideRule {
        name: "Unsustained wind",
        applies: |ctx| ctx.wind_speed_mph.is_some_and(|w| w >= 15.0) && ctx.sustained_wind_hours < 3,
        cap: Some(Rating::Fair),
        annotation: Some(
            "Wind has not blown long enough to build real swell; treat the current reading as unreliable.",
        ),
    },
    OverrideRule {
        name: "Storm warning",
        applies: |ctx| ctx.has_alert(&[AlertEvent::StormWarning, AlertEvent::HurricaneForceWind]),
        cap: None,
        annotation: Some(
            "DANGER: Storm Warning in effect. Expert surfers only; extreme wind, cold water and rip hazard.",
        ),
    },
    OverrideRule {
        name: "Expert only",
        applies: |ctx| ctx.wind_above(35.0),
        cap: None,
        annotation: Some("Wind over 35 mph: expert-only conditions."),
    },
    OverrideRule {
        name: "Rock surge",
        applies: |ctx| {
            matches!(ctx.break_type, BreakType::Point | BreakType::Reef)
                && ctx.wind_speed_mph.is_some_and(|w| w >= 25.0)
        },
        cap: None,
        annotation: Some("Strong wind at a rocky break: dangerous surge over the rocks."),
    },
];

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Returns every rule in `rules` whose predicate holds.
pub fn fire(rules: &[OverrideRule], ctx: &OverrideContext) -> Vec<FiredOverride> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| FiredOverride {
            name: rule.name.to_string(),
            cap: rule.cap,
            annotation: rule.annotation.map(String::from),
        })
        .collect()
}

/// Caps `rating` by every fired override.
pub fn cap_overall(rating: Rating, fired: &[FiredOverride]) -> Rating {
    fired
        .iter()
        .filter_map(|o| o.cap)
        .fold(rating, Rating::cap)
}
