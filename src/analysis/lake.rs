//! Lake regime.
//!
//! Lake surf is wind swell: it only exists while a strong wind has been
//! blowing across enough open water for long enough. Duration matters as
//! much as speed, and an active gale or storm warning is good news for
//! wave size (with safety caveats) rather than a reason to stay home.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::alert::danger_flags::{self, LAKE_RULES, OverrideContext};
use crate::analysis::crosscheck;
use crate::analysis::normalize::NormalizedSignals;
use crate::analysis::regime::Regime;
use crate::analysis::summary::{self, Assessment};
use crate::analysis::wind::{WindRelation, classify_relation};
use crate::analysis::{FactorKind, FactorRating};
use crate::model::{Alert, AlertEvent, ForecastSample, Rating, SurfError, Wind};
use crate::spots::Spot;
use crate::units;

const CALM_MPH: f64 = 10.0;
/// Wind at or above this builds lake swell.
pub const SUSTAINED_MPH: f64 = 15.0;
const STRONG_MPH: f64 = 25.0;
const EXPERT_MPH: f64 = 35.0;
/// Hours of sustained wind before the surf is real.
pub const MIN_SUSTAINED_HOURS: u32 = 3;
const FULL_DAY_HOURS: u32 = 24;
const DEVELOPED_HOURS: u32 = 48;
const PRIME_HOURS: u32 = 72;
const SHORT_PERIOD_S: f64 = 5.0;

// ---------------------------------------------------------------------------
// Wind history
// ---------------------------------------------------------------------------

/// Consecutive hourly samples at or before `at` with wind at or above
/// 15 mph, counted back from the latest one.
pub fn sustained_hours(forecast: &[ForecastSample], at: DateTime<Utc>) -> u32 {
    let mut hours = 0;
    let mut later: Option<DateTime<Utc>> = None;
    for sample in forecast.iter().rev().filter(|s| s.time <= at) {
        if later.is_some_and(|t| t - sample.time > Duration::hours(1)) {
            break;
        }
        if !sample.wind.is_some_and(|w| w.speed_mph >= SUSTAINED_MPH) {
            break;
        }
        hours += 1;
        later = Some(sample.time);
    }
    hours
}

/// Whether a strong onshore wind blew at some point in the 24 hours before
/// `at`. Waves it built are still arriving when the wind turns offshore.
pub fn onshore_blow_before(forecast: &[ForecastSample], at: DateTime<Utc>, facing_deg: f64) -> bool {
    let since = at - Duration::hours(24);
    forecast
        .iter()
        .filter(|s| s.time >= since && s.time < at)
        .filter_map(|s| s.wind)
        .any(|w| {
            w.speed_mph >= SUSTAINED_MPH
                && w.from_deg
                    .is_some_and(|from| classify_relation(from, facing_deg) == WindRelation::Onshore)
        })
}

// ---------------------------------------------------------------------------
// Factor raters
// ---------------------------------------------------------------------------

/// Rating from wind speed alone. Above 35 mph the surf is too chaotic to
/// stay Epic.
pub fn wind_band(speed_mph: f64) -> Rating {
    if speed_mph < CALM_MPH {
        Rating::Poor
    } else if speed_mph <= SUSTAINED_MPH {
        Rating::Fair
    } else if speed_mph <= STRONG_MPH {
        Rating::Good
    } else if speed_mph <= EXPERT_MPH {
        Rating::Epic
    } else {
        Rating::Good
    }
}

/// Ceiling set by how long the wind has been blowing.
pub fn duration_cap(hours: u32) -> Rating {
    if hours < MIN_SUSTAINED_HOURS {
        Rating::Fair
    } else if hours < FULL_DAY_HOURS {
        Rating::Good
    } else {
        Rating::Epic
    }
}

pub fn rate_lake_wind(wind: &Wind, sustained_hours: u32) -> FactorRating {
    let speed = wind.speed_mph;
    let label = match wind.from_deg {
        Some(from) => format!("{:.0} mph from {}.", speed, units::degrees_to_compass(from)),
        None => format!("{:.0} mph.", speed),
    };
    let mut rated = FactorRating::rated(FactorKind::Wind, wind_band(speed)).with_note(label);

    if speed < CALM_MPH {
        return rated.with_note("Too light to build rideable lake surf.");
    }
    if speed < SUSTAINED_MPH {
        return rated.with_note("Building; needs 15+ mph for several hours.");
    }
    if speed > EXPERT_MPH {
        rated = rated.with_note("Over 35 mph: huge, chaotic surf for experts only.");
    }

    let cap = duration_cap(sustained_hours);
    rated = rated.map_rating(|r| r.cap(cap));
    let duration_note = if sustained_hours < MIN_SUSTAINED_HOURS {
        format!(
            "Only {} h of sustained wind; the current reading is unreliable evidence of surf.",
            sustained_hours
        )
    } else if sustained_hours >= PRIME_HOURS {
        format!("{} h of sustained wind: best quality lake swell.", sustained_hours)
    } else if sustained_hours >= DEVELOPED_HOURS {
        format!("{} h of sustained wind: well-developed swell.", sustained_hours)
    } else {
        format!("{} h of sustained wind.", sustained_hours)
    };
    rated.with_note(duration_note)
}

/// Forecast wave height (combined sea, else primary). Very short periods
/// cost one step.
pub fn rate_lake_waves(sample: Option<&ForecastSample>) -> FactorRating {
    let Some(wave) = sample.and_then(|s| crosscheck::rated_swell(Regime::Lake, s)) else {
        return FactorRating::not_rated(FactorKind::Waves, "no wave forecast for this session");
    };
    let band = if wave.height_ft < 1.0 {
        Rating::Poor
    } else if wave.height_ft <= 2.0 {
        Rating::Fair
    } else if wave.height_ft <= 4.0 {
        Rating::Good
    } else {
        Rating::Epic
    };
    let mut rated = FactorRating::rated(FactorKind::Waves, band).with_note(format!(
        "{:.1} ft @ {:.0} s.",
        wave.height_ft, wave.period_s
    ));
    if wave.period_s < SHORT_PERIOD_S {
        rated = rated
            .map_rating(Rating::lowered)
            .with_note("Very short period: choppy and closely spaced.");
    }
    if wave.height_ft > 6.0 {
        rated = rated.with_note("Big lake surf: heavy and cold, know your limits.");
    }
    rated
}

pub fn rate_lake_direction(
    wind: &Wind,
    facing_deg: f64,
    sustained_hours: u32,
    onshore_before: bool,
) -> FactorRating {
    if wind.speed_mph < CALM_MPH {
        return FactorRating::not_rated(FactorKind::Direction, "wind too light for direction to matter");
    }
    let Some(from) = wind.from_deg else {
        return FactorRating::not_rated(FactorKind::Direction, "wind direction unavailable");
    };
    match classify_relation(from, facing_deg) {
        WindRelation::Onshore if sustained_hours >= MIN_SUSTAINED_HOURS => {
            FactorRating::rated(FactorKind::Direction, Rating::Good)
                .with_note("Onshore wind with fetch: this is what builds the waves.")
        }
        WindRelation::Onshore => FactorRating::rated(FactorKind::Direction, Rating::Fair)
            .with_note("Onshore wind that has only just started."),
        WindRelation::Offshore if onshore_before => {
            FactorRating::rated(FactorKind::Direction, Rating::Epic)
                .with_note("Offshore wind grooming leftover swell from the recent onshore blow.")
        }
        WindRelation::Offshore => FactorRating::rated(FactorKind::Direction, Rating::Poor)
            .with_note("Offshore wind pushes the waves away from this shore."),
        WindRelation::Cross => FactorRating::rated(FactorKind::Direction, Rating::Fair)
            .with_note("Cross-shore wind: some swell wraps in."),
    }
}

/// On a lake an active gale or storm warning means waves. `None` when the
/// alert feed could not be read.
pub fn rate_marine_alerts(alerts: Option<&[Alert]>) -> FactorRating {
    let Some(alerts) = alerts else {
        return FactorRating::not_rated(FactorKind::MarineAlerts, "alert feed unavailable");
    };
    if alerts.is_empty() {
        return FactorRating::not_rated(FactorKind::MarineAlerts, "no active marine alerts, no marine concern");
    }
    let has = |event: AlertEvent| alerts.iter().any(|a| a.event == event);

    if has(AlertEvent::StormWarning) || has(AlertEvent::HurricaneForceWind) {
        FactorRating::rated(FactorKind::MarineAlerts, Rating::Epic)
            .with_note("Storm-force warning: big surf, but dangerous.")
    } else if has(AlertEvent::GaleWarning) {
        FactorRating::rated(FactorKind::MarineAlerts, Rating::Epic)
            .with_note("Gale Warning: the classic lake surf setup.")
    } else if has(AlertEvent::SmallCraftAdvisory) || has(AlertEvent::HighSurfAdvisory) {
        FactorRating::rated(FactorKind::MarineAlerts, Rating::Good)
            .with_note("Small craft or high surf advisory: waves are likely.")
    } else {
        FactorRating::not_rated(FactorKind::MarineAlerts, "no surf-relevant marine alerts")
    }
}

// ---------------------------------------------------------------------------
// Seasonal context
// ---------------------------------------------------------------------------

pub fn season_note(month: u32) -> &'static str {
    match month {
        9..=11 => "Fall is prime lake surf season: frequent storms and water still holding some summer warmth.",
        12 | 1..=3 => "Winter storms are the strongest of the year, but ice and hypothermia are real hazards.",
        4 | 5 => "Spring water is at its coldest; storms are less frequent.",
        _ => "Summer is inconsistent on the lakes; surf needs a passing storm system.",
    }
}

const LAKE_SAFETY: [&str; 2] = [
    "Lake water is cold for most of the year; dress for the water, not the air.",
    "Lake breaks rarely have lifeguards. Never surf alone.",
];

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

pub fn assess(spot: &Spot, signals: &NormalizedSignals) -> Result<Assessment, SurfError> {
    let Some(forecast_wind) = signals.wind else {
        return Err(match &signals.sample {
            Err(err) => err.clone(),
            Ok(_) => SurfError::InsufficientData {
                spot: spot.name.clone(),
                detail: "no wind reading from the forecast or a fresh buoy".to_string(),
            },
        });
    };

    let at = signals.evaluated_at;
    let check = crosscheck::cross_check(Regime::Lake, signals);
    let wind = check.buoy_wind.unwrap_or(forecast_wind);
    let sustained = sustained_hours(&signals.forecast, at);
    let onshore_before = onshore_blow_before(&signals.forecast, at, spot.facing_deg);

    let wind_factor = rate_lake_wind(&wind, sustained);
    let wind_rating = wind_factor.rating();
    let factors = vec![
        wind_factor,
        rate_lake_waves(signals.sample.as_ref().ok()),
        rate_lake_direction(&wind, spot.facing_deg, sustained, onshore_before),
        rate_marine_alerts(signals.alerts.as_deref()),
    ];

    let mut base = summary::central_rating(&factors).ok_or_else(|| SurfError::InsufficientData {
        spot: spot.name.clone(),
        detail: "none of the lake factors could be rated".to_string(),
    })?;

    let alerts: Vec<AlertEvent> = signals
        .alerts
        .iter()
        .flatten()
        .map(|a| a.event.clone())
        .collect();

    let mut notes = Vec::new();
    let storm_setup = alerts
        .iter()
        .any(|e| matches!(e, AlertEvent::GaleWarning | AlertEvent::StormWarning));
    if storm_setup
        && sustained >= MIN_SUSTAINED_HOURS
        && wind_rating.is_some_and(|r| r >= Rating::Good)
    {
        base = base.floor(Rating::Good);
        notes.push("Warning-level wind has been blowing for hours: a real lake swell is running.".to_string());
    }

    let ctx = OverrideContext {
        wind_speed_mph: Some(wind.speed_mph),
        sustained_wind_hours: sustained,
        alerts,
        ..OverrideContext::new(spot.break_type)
    };
    let fired = danger_flags::fire(LAKE_RULES, &ctx);
    let overall = danger_flags::cap_overall(base, &fired);

    notes.push(season_note(signals.local(at).month()).to_string());
    if !spot.notes.is_empty() {
        notes.push(spot.notes.clone());
    }

    let estimated_surf_ft = signals
        .sample
        .as_ref()
        .ok()
        .and_then(|s| crosscheck::rated_swell(Regime::Lake, s))
        .map(|w| w.height_ft);

    Ok(Assessment {
        factors,
        overall,
        fired,
        crosscheck: check,
        estimated_surf_ft,
        best_window: summary::lake_window(signals),
        outlook: summary::lake_outlook(signals),
        safety: LAKE_SAFETY.iter().map(|s| s.to_string()).collect(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertSeverity, Swell};
    use chrono::TimeZone;

    // Stoney Point faces SSE (157.5°).
    const FACING: f64 = 157.5;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap()
    }

    fn hourly(winds: &[(f64, f64)], end: DateTime<Utc>) -> Vec<ForecastSample> {
        let start = end - Duration::hours(winds.len() as i64 - 1);
        winds
            .iter()
            .enumerate()
            .map(|(i, &(speed_mph, from))| ForecastSample {
                time: start + Duration::hours(i as i64),
                primary_swell: None,
                secondary_swell: None,
                sea: Some(Swell {
                    height_ft: 3.0,
                    period_s: 6.0,
                    direction_deg: from,
                }),
                wind: Some(Wind {
                    speed_mph,
                    from_deg: Some(from),
                }),
                sea_level_ft: None,
            })
            .collect()
    }

    fn alert(event: AlertEvent) -> Alert {
        Alert {
            event,
            severity: AlertSeverity::Moderate,
            headline: String::new(),
            description: String::new(),
            effective: None,
            expires: None,
        }
    }

    #[test]
    fn test_wind_band_boundaries() {
        assert_eq!(wind_band(9.9), Rating::Poor);
        assert_eq!(wind_band(10.0), Rating::Fair);
        assert_eq!(wind_band(15.0), Rating::Fair);
        assert_eq!(wind_band(15.1), Rating::Good);
        assert_eq!(wind_band(25.0), Rating::Good);
        assert_eq!(wind_band(30.0), Rating::Epic);
        assert_eq!(wind_band(35.0), Rating::Epic);
        assert_eq!(wind_band(40.0), Rating::Good);
    }

    #[test]
    fn test_sustained_hours_counts_back_from_session() {
        let mut winds = vec![(8.0, 180.0); 5];
        winds.extend(vec![(20.0, 180.0); 6]);
        let forecast = hourly(&winds, at());
        assert_eq!(sustained_hours(&forecast, at()), 6);
        assert_eq!(sustained_hours(&forecast, at() - Duration::hours(6)), 0);
    }

    #[test]
    fn test_sustained_hours_breaks_on_gap() {
        let mut forecast = hourly(&[(20.0, 180.0); 6], at());
        forecast.remove(2);
        assert_eq!(sustained_hours(&forecast, at()), 3);
    }

    #[test]
    fn test_unsustained_wind_is_capped_and_flagged() {
        let rated = rate_lake_wind(&Wind { speed_mph: 30.0, from_deg: Some(180.0) }, 1);
        assert_eq!(rated.rating(), Some(Rating::Fair));
        assert!(rated.notes.iter().any(|n| n.contains("unreliable")));
    }

    #[test]
    fn test_long_blow_notes() {
        let rated = rate_lake_wind(&Wind { speed_mph: 28.0, from_deg: Some(180.0) }, 50);
        assert_eq!(rated.rating(), Some(Rating::Epic));
        assert!(rated.notes.iter().any(|n| n.contains("well-developed swell")));
        let rated = rate_lake_wind(&Wind { speed_mph: 28.0, from_deg: Some(180.0) }, 80);
        assert!(rated.notes.iter().any(|n| n.contains("best quality")));
    }

    #[test]
    fn test_direction_depends_on_history() {
        let onshore = Wind { speed_mph: 20.0, from_deg: Some(160.0) };
        assert_eq!(rate_lake_direction(&onshore, FACING, 5, false).rating(), Some(Rating::Good));
        assert_eq!(rate_lake_direction(&onshore, FACING, 1, false).rating(), Some(Rating::Fair));

        let offshore = Wind { speed_mph: 20.0, from_deg: Some(340.0) };
        assert_eq!(rate_lake_direction(&offshore, FACING, 5, true).rating(), Some(Rating::Epic));
        assert_eq!(rate_lake_direction(&offshore, FACING, 5, false).rating(), Some(Rating::Poor));

        let light = Wind { speed_mph: 5.0, from_deg: Some(160.0) };
        assert_eq!(rate_lake_direction(&light, FACING, 0, false).rating(), None);
    }

    #[test]
    fn test_onshore_blow_before_window() {
        let mut winds = vec![(20.0, 160.0); 4];
        winds.extend(vec![(20.0, 340.0); 4]);
        let forecast = hourly(&winds, at());
        assert!(onshore_blow_before(&forecast, at(), FACING));
        assert!(!onshore_blow_before(&forecast, at() + Duration::hours(30), FACING));
    }

    #[test]
    fn test_marine_alert_ratings() {
        assert_eq!(rate_marine_alerts(None).rating(), None);
        let none: Vec<Alert> = Vec::new();
        assert_eq!(rate_marine_alerts(Some(none.as_slice())).rating(), None);
        assert_eq!(
            rate_marine_alerts(Some(&[alert(AlertEvent::GaleWarning)][..])).rating(),
            Some(Rating::Epic)
        );
        assert_eq!(
            rate_marine_alerts(Some(&[alert(AlertEvent::SmallCraftAdvisory)][..])).rating(),
            Some(Rating::Good)
        );
        assert_eq!(
            rate_marine_alerts(Some(&[alert(AlertEvent::Other("Dense Fog Advisory".into()))][..])).rating(),
            None
        );
    }

    #[test]
    fn test_short_period_waves_lose_a_step() {
        let sample = ForecastSample {
            time: at(),
            primary_swell: None,
            secondary_swell: None,
            sea: Some(Swell { height_ft: 3.0, period_s: 4.0, direction_deg: 160.0 }),
            wind: None,
            sea_level_ft: None,
        };
        assert_eq!(rate_lake_waves(Some(&sample)).rating(), Some(Rating::Fair));
        assert_eq!(rate_lake_waves(None).rating(), None);
    }

    #[test]
    fn test_season_notes() {
        assert!(season_note(10).contains("prime"));
        assert!(season_note(1).contains("hypothermia"));
        assert!(season_note(7).contains("inconsistent"));
    }
}
