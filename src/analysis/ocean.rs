//! Ocean regime: swell, direction, wind and tide factors, then the ocean
//! override rules.

use chrono::Duration;

use crate::alert::danger_flags::{self, OCEAN_RULES, OverrideContext};
use crate::analysis::crosscheck;
use crate::analysis::normalize::NormalizedSignals;
use crate::analysis::regime::Regime;
use crate::analysis::summary::{self, Assessment};
use crate::analysis::{FactorKind, FactorRating, direction, swell, tide, wind};
use crate::model::{SurfError, Swell};
use crate::spots::Spot;

/// Negative tides this close to the session count.
const NEGATIVE_TIDE_WINDOW_HOURS: i64 = 12;

/// Keeps the lower of a forecast-based and a buoy-based rating of the same
/// factor, so observations can only pull a factor down.
fn keep_lower(forecast: FactorRating, observed: FactorRating, label: &str) -> FactorRating {
    match (forecast.rating(), observed.rating()) {
        (Some(f), Some(o)) if o < f => forecast
            .map_rating(|_| o)
            .with_note(format!("Buoy-observed {} rates {}; using the lower rating.", label, o)),
        _ => forecast,
    }
}

/// Smaller height and shorter period of the rated and observed swell.
fn lower_swell(rated: Option<Swell>, observed: Option<Swell>) -> Option<Swell> {
    match (rated, observed) {
        (Some(r), Some(o)) => Some(Swell {
            height_ft: r.height_ft.min(o.height_ft),
            period_s: r.period_s.min(o.period_s),
            direction_deg: o.direction_deg,
        }),
        (r, o) => r.or(o),
    }
}

pub fn assess(spot: &Spot, signals: &NormalizedSignals) -> Result<Assessment, SurfError> {
    let sample = signals.sample.clone()?;
    let check = crosscheck::cross_check(Regime::Ocean, signals);
    let mut factors = Vec::new();
    let mut notes = Vec::new();

    let primary = crosscheck::rated_swell(Regime::Ocean, &sample);

    // Swell
    factors.push(match primary {
        Some(p) => {
            let mut rated = swell::rate_swell(&p, sample.secondary_swell.as_ref(), spot.break_type);
            if sample.primary_swell.is_none() {
                rated = rated.with_note("No separate swell partition; rating the combined sea.");
            }
            match check.buoy_swell {
                Some(observed) => keep_lower(
                    rated,
                    swell::rate_swell(&observed, None, spot.break_type),
                    "swell",
                ),
                None => rated,
            }
        }
        None => FactorRating::not_rated(FactorKind::Swell, "forecast sample has no swell values"),
    });

    // Direction
    factors.push(match primary {
        Some(p) => direction::rate_direction(p.direction_deg, spot.facing_deg, spot.break_type),
        None => FactorRating::not_rated(FactorKind::Direction, "no swell direction in the forecast"),
    });

    // Wind
    factors.push(match signals.wind {
        Some(w) => {
            let rated = wind::rate_ocean_wind(&w, spot.facing_deg);
            match check.buoy_wind {
                Some(observed) => keep_lower(rated, wind::rate_ocean_wind(&observed, spot.facing_deg), "wind"),
                None => rated,
            }
        }
        None => FactorRating::not_rated(FactorKind::Wind, "no wind reading from forecast or buoy"),
    });

    // Tide, only when a series was supplied
    if let Some(series) = &signals.tides {
        factors.push(tide::rate_tide(
            series,
            signals.evaluated_at,
            &spot.tidal_preference,
            signals.utc_offset,
        ));
    }

    let base = summary::central_rating(&factors).ok_or_else(|| SurfError::InsufficientData {
        spot: spot.name.clone(),
        detail: "none of the ocean factors could be rated".to_string(),
    })?;

    let effective_swell = lower_swell(primary, check.buoy_swell);
    let estimated_surf_ft =
        effective_swell.map(|s| swell::estimated_wave_height(s.height_ft, s.period_s));
    let ctx = OverrideContext {
        swell_height_ft: effective_swell.map(|s| s.height_ft),
        swell_period_s: effective_swell.map(|s| s.period_s),
        estimated_surf_ft,
        wind_speed_mph: check.buoy_wind.or(signals.wind).map(|w| w.speed_mph),
        alerts: signals
            .alerts
            .iter()
            .flatten()
            .map(|a| a.event.clone())
            .collect(),
        min_tide_ft: signals.tides.as_ref().and_then(|series| {
            tide::min_tide_near(
                series,
                signals.evaluated_at,
                Duration::hours(NEGATIVE_TIDE_WINDOW_HOURS),
            )
        }),
        ..OverrideContext::new(spot.break_type)
    };
    let fired = danger_flags::fire(OCEAN_RULES, &ctx);
    let overall = danger_flags::cap_overall(base, &fired);
    if overall < base {
        notes.push(format!("Overrides cap the session at {} (factors alone: {}).", overall, base));
    }
    if spot.tide_station.is_some() && signals.tides.is_none() {
        notes.push("Tide predictions unavailable; tide not rated.".to_string());
    }
    if !spot.notes.is_empty() {
        notes.push(spot.notes.clone());
    }

    Ok(Assessment {
        factors,
        overall,
        fired,
        best_window: summary::ocean_window(signals),
        crosscheck: check,
        estimated_surf_ft,
        outlook: Vec::new(),
        safety: Vec::new(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize::{EvaluationTarget, NormalizeOptions, normalize};
    use crate::model::{
        Feed, ForecastSample, MarineForecast, RawFeeds, Rating, TideKind, TidePrediction,
        TideSeries, Wind,
    };
    use crate::spots::SpotRegistry;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()
    }

    fn feeds(swell: Swell, wind: Wind, tides: Feed<TideSeries>) -> RawFeeds {
        RawFeeds {
            marine: Feed::Available(MarineForecast {
                utc_offset: FixedOffset::east_opt(0).unwrap(),
                samples: vec![ForecastSample {
                    time: now(),
                    primary_swell: Some(swell),
                    secondary_swell: None,
                    sea: None,
                    wind: Some(wind),
                    sea_level_ft: None,
                }],
            }),
            buoy: Feed::NotApplicable("test".into()),
            tides,
            alerts: Feed::Available(Vec::new()),
            weather: Feed::NotApplicable("test".into()),
        }
    }

    fn assess_at(spot_name: &str, feeds: RawFeeds) -> Result<Assessment, SurfError> {
        let registry = SpotRegistry::builtin().unwrap();
        let spot = registry.find(spot_name).unwrap();
        let signals = normalize(spot, feeds, EvaluationTarget::Now, now(), &NormalizeOptions::default());
        assess(spot, &signals)
    }

    fn tides(low_ft: f64) -> TideSeries {
        TideSeries {
            station_id: "9410170".into(),
            predictions: vec![
                TidePrediction {
                    time: now() - Duration::hours(3),
                    height_ft: low_ft,
                    kind: TideKind::Low,
                },
                TidePrediction {
                    time: now() + Duration::hours(3),
                    height_ft: 5.0,
                    kind: TideKind::High,
                },
            ],
        }
    }

    #[test]
    fn test_clean_groundswell_rates_well() {
        // Rincon faces SSW; light offshore wind from the north.
        let assessment = assess_at(
            "Rincon Point",
            feeds(
                Swell { height_ft: 5.0, period_s: 15.0, direction_deg: 205.0 },
                Wind { speed_mph: 3.0, from_deg: Some(20.0) },
                Feed::NotApplicable("test".into()),
            ),
        )
        .unwrap();
        assert_eq!(assessment.overall, Rating::Epic);
        assert!(assessment.fired.is_empty());
        assert!(!assessment.factors.iter().any(|f| f.kind == FactorKind::Tide));
    }

    #[test]
    fn test_flat_caps_overall_poor() {
        let assessment = assess_at(
            "Rincon Point",
            feeds(
                Swell { height_ft: 0.5, period_s: 16.0, direction_deg: 205.0 },
                Wind { speed_mph: 2.0, from_deg: Some(20.0) },
                Feed::NotApplicable("test".into()),
            ),
        )
        .unwrap();
        assert_eq!(assessment.overall, Rating::Poor);
    }

    #[test]
    fn test_lower_swell_takes_the_smaller_values() {
        let rated = Swell { height_ft: 0.5, period_s: 16.0, direction_deg: 205.0 };
        let observed = Swell { height_ft: 2.0, period_s: 12.0, direction_deg: 210.0 };
        let lower = lower_swell(Some(rated), Some(observed)).unwrap();
        assert_eq!(lower.height_ft, 0.5);
        assert_eq!(lower.period_s, 12.0);
        assert_eq!(lower_swell(Some(rated), None), Some(rated));
        assert_eq!(lower_swell(None, None), None);
    }

    #[test]
    fn test_tide_factor_present_when_series_supplied() {
        let assessment = assess_at(
            "Ocean Beach",
            feeds(
                Swell { height_ft: 4.0, period_s: 13.0, direction_deg: 250.0 },
                Wind { speed_mph: 4.0, from_deg: Some(90.0) },
                Feed::Available(tides(-0.6)),
            ),
        )
        .unwrap();
        assert!(assessment.factors.iter().any(|f| f.kind == FactorKind::Tide));
        assert!(
            assessment.fired.iter().any(|o| o.name == "Negative tide"),
            "Ocean Beach is a beach break"
        );
    }

    #[test]
    fn test_dangerous_wind_is_poor_with_rip_warning() {
        let assessment = assess_at(
            "Ocean Beach",
            feeds(
                Swell { height_ft: 4.0, period_s: 14.0, direction_deg: 250.0 },
                Wind { speed_mph: 25.0, from_deg: Some(90.0) },
                Feed::NotApplicable("test".into()),
            ),
        )
        .unwrap();
        assert_eq!(assessment.overall, Rating::Poor);
        assert!(assessment.fired.iter().any(|o| o.name == "Dangerous wind"));
    }

    #[test]
    fn test_missing_marine_forecast_is_an_error() {
        let mut raw = feeds(
            Swell { height_ft: 4.0, period_s: 14.0, direction_deg: 250.0 },
            Wind { speed_mph: 5.0, from_deg: None },
            Feed::NotApplicable("test".into()),
        );
        raw.marine = Feed::Unavailable(SurfError::upstream(
            crate::logging::DataSource::Marine,
            "HTTP 503",
        ));
        assert!(matches!(
            assess_at("Ocean Beach", raw),
            Err(SurfError::UpstreamUnavailable { .. })
        ));
    }
}
