//! Session summarizer.
//!
//! Turns a regime assessment into the final [`SessionReport`]: the central
//! tendency of the factor ratings, the best time window, a lake outlook,
//! wetsuit advice and the notes collected along the way.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::alert::danger_flags::FiredOverride;
use crate::analysis::crosscheck::{ConditionsSource, CrossCheck};
use crate::analysis::normalize::NormalizedSignals;
use crate::analysis::regime::Regime;
use crate::analysis::{FactorKind, FactorRating, lake};
use crate::model::{BreakType, ForecastSample, Rating, TideKind};
use crate::spots::Spot;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Building,
    Stable,
    Dropping,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Building => write!(f, "building"),
            Trend::Stable => write!(f, "stable"),
            Trend::Dropping => write!(f, "dropping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOutlook {
    pub date: NaiveDate,
    pub median_wind_mph: f64,
    pub rating: Rating,
    /// Versus the previous day; `None` without data for that day.
    pub trend: Option<Trend>,
}

/// What one regime evaluation produced, before summarizing.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub factors: Vec<FactorRating>,
    /// Overall rating after every fired cap.
    pub overall: Rating,
    pub fired: Vec<FiredOverride>,
    pub crosscheck: CrossCheck,
    pub estimated_surf_ft: Option<f64>,
    pub best_window: Option<SessionWindow>,
    pub outlook: Vec<DayOutlook>,
    pub safety: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub spot: String,
    pub regime: Regime,
    pub break_type: BreakType,
    /// Session instant in the spot's local offset.
    pub evaluated_at: DateTime<FixedOffset>,
    pub overall: Rating,
    pub factors: Vec<FactorRating>,
    pub overrides: Vec<FiredOverride>,
    pub safety: Vec<String>,
    pub best_window: Option<SessionWindow>,
    pub current_conditions: String,
    pub conditions_source: ConditionsSource,
    pub discrepancy: Option<String>,
    pub estimated_surf_ft: Option<f64>,
    pub wetsuit: Option<String>,
    pub outlook: Vec<DayOutlook>,
    pub notes: Vec<String>,
    pub data_gaps: Vec<String>,
}

impl SessionReport {
    pub fn factor(&self, kind: FactorKind) -> Option<&FactorRating> {
        self.factors.iter().find(|f| f.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Central rating
// ---------------------------------------------------------------------------

/// Mean of the rated factors, with halves rounding down. `None` when no
/// factor could be rated.
pub fn central_rating(factors: &[FactorRating]) -> Option<Rating> {
    let scores: Vec<u8> = factors
        .iter()
        .filter_map(FactorRating::rating)
        .map(Rating::score)
        .collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
    let rounded = (mean - 0.5).ceil().max(0.0);
    Some(Rating::from_score(rounded as u8))
}

// ---------------------------------------------------------------------------
// Best window
// ---------------------------------------------------------------------------

/// Longest run of hourly samples satisfying `keep`, as (first, last, length).
fn longest_run<'a>(
    samples: impl Iterator<Item = &'a ForecastSample>,
    keep: impl Fn(&ForecastSample) -> bool,
) -> Option<(&'a ForecastSample, &'a ForecastSample, usize)> {
    let mut best: Option<(&ForecastSample, &ForecastSample, usize)> = None;
    let mut current: Option<(&ForecastSample, &ForecastSample, usize)> = None;

    for sample in samples {
        if !keep(sample) {
            current = None;
            continue;
        }
        current = match current {
            Some((first, last, len)) if sample.time - last.time <= Duration::hours(1) => {
                Some((first, sample, len + 1))
            }
            _ => Some((sample, sample, 1)),
        };
        if let Some(run) = current {
            if best.is_none_or(|(_, _, best_len)| run.2 > best_len) {
                best = Some(run);
            }
        }
    }
    best
}

fn wind_speed(sample: &ForecastSample) -> Option<f64> {
    sample.wind.map(|w| w.speed_mph)
}

fn max_wind_between(samples: &[ForecastSample], start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64> {
    samples
        .iter()
        .filter(|s| s.time >= start && s.time <= end)
        .filter_map(wind_speed)
        .reduce(f64::max)
}

/// Ocean: around the daylight low tide nearest the session (one hour
/// before to two hours after). Without tides, the longest light-wind
/// stretch of the session day.
pub fn ocean_window(signals: &NormalizedSignals) -> Option<SessionWindow> {
    let at = signals.evaluated_at;

    if let Some(series) = &signals.tides {
        let low = series
            .predictions
            .iter()
            .filter(|p| p.kind == TideKind::Low)
            .filter(|p| (5..=19).contains(&signals.local(p.time).hour()))
            .min_by_key(|p| (p.time - at).abs());
        if let Some(low) = low {
            let start = low.time - Duration::hours(1);
            let end = low.time + Duration::hours(2);
            let mut reason = format!(
                "Around the {:.1} ft low tide at {}, surfing into the incoming push",
                low.height_ft,
                signals.local(low.time).format("%a %H:%M")
            );
            if let Some(max) = max_wind_between(&signals.forecast, start, end) {
                reason.push_str(&format!("; forecast wind up to {:.0} mph", max));
            }
            return Some(SessionWindow {
                start: signals.local(start),
                end: signals.local(end),
                reason: format!("{}.", reason),
            });
        }
    }

    let day = signals.local(at).date_naive();
    let (first, last, len) = longest_run(
        signals
            .forecast
            .iter()
            .filter(|s| signals.local(s.time).date_naive() == day),
        |s| wind_speed(s).is_some_and(|w| w < 10.0),
    )?;
    Some(SessionWindow {
        start: signals.local(first.time),
        end: signals.local(last.time + Duration::hours(1)),
        reason: format!("Lightest wind of the day: {} hours under 10 mph.", len),
    })
}

/// Lake: the longest sustained blow (≥ 15 mph, at least three hours) in
/// the next 72 hours. Waves need about six hours to build and linger for
/// about three after the wind eases.
pub fn lake_window(signals: &NormalizedSignals) -> Option<SessionWindow> {
    let at = signals.evaluated_at;
    let horizon = at + Duration::hours(72);
    let (first, last, len) = longest_run(
        signals
            .forecast
            .iter()
            .filter(|s| s.time >= at && s.time <= horizon),
        |s| wind_speed(s).is_some_and(|w| w >= lake::SUSTAINED_MPH),
    )?;
    if len < lake::MIN_SUSTAINED_HOURS as usize {
        return None;
    }
    let mean = signals
        .forecast
        .iter()
        .filter(|s| s.time >= first.time && s.time <= last.time)
        .filter_map(wind_speed)
        .sum::<f64>()
        / len as f64;
    Some(SessionWindow {
        start: signals.local(first.time + Duration::hours(6)),
        end: signals.local(last.time + Duration::hours(3)),
        reason: format!(
            "{} hours of sustained wind averaging {:.0} mph; waves peak once it has blown for a while and linger after it eases.",
            len, mean
        ),
    })
}

// ---------------------------------------------------------------------------
// Lake outlook
// ---------------------------------------------------------------------------

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn day_median_wind(signals: &NormalizedSignals, day: NaiveDate) -> Option<f64> {
    median(
        signals
            .forecast
            .iter()
            .filter(|s| signals.local(s.time).date_naive() == day)
            .filter_map(wind_speed)
            .collect(),
    )
}

/// Session day plus the next two, rated from each day's median wind.
/// A change of more than 3 mph from the previous day is a trend.
pub fn lake_outlook(signals: &NormalizedSignals) -> Vec<DayOutlook> {
    let today = signals.local(signals.evaluated_at).date_naive();
    let mut previous = today.pred_opt().and_then(|d| day_median_wind(signals, d));
    let mut outlook = Vec::new();

    for offset in 0..3 {
        let day = today + Duration::days(offset);
        let Some(median_wind_mph) = day_median_wind(signals, day) else {
            previous = None;
            continue;
        };
        let trend = previous.map(|prev| {
            if median_wind_mph > prev + 3.0 {
                Trend::Building
            } else if median_wind_mph < prev - 3.0 {
                Trend::Dropping
            } else {
                Trend::Stable
            }
        });
        outlook.push(DayOutlook {
            date: day,
            median_wind_mph,
            rating: lake::wind_band(median_wind_mph),
            trend,
        });
        previous = Some(median_wind_mph);
    }
    outlook
}

// ---------------------------------------------------------------------------
// Wetsuit
// ---------------------------------------------------------------------------

pub fn wetsuit_recommendation(water_temp_c: f64) -> &'static str {
    if water_temp_c >= 24.0 {
        "Boardshorts or a rash guard"
    } else if water_temp_c >= 21.0 {
        "2 mm spring suit or top"
    } else if water_temp_c >= 17.0 {
        "3/2 mm full suit"
    } else if water_temp_c >= 14.0 {
        "4/3 mm full suit, booties optional"
    } else if water_temp_c >= 10.0 {
        "5/4 mm hooded suit with boots and gloves"
    } else {
        "6/5 mm hooded suit, 7 mm boots and lobster mitts"
    }
}

// ---------------------------------------------------------------------------
// Summarize
// ---------------------------------------------------------------------------

pub fn summarize(
    spot: &Spot,
    regime: Regime,
    signals: &NormalizedSignals,
    assessment: Assessment,
) -> SessionReport {
    let mut safety: Vec<String> = assessment
        .fired
        .iter()
        .filter_map(|o| o.annotation.clone())
        .collect();
    safety.extend(assessment.safety);

    let mut notes = signals.notes.clone();
    notes.extend(assessment.notes);
    if let Some(period) = &signals.weather {
        notes.push(format!(
            "NWS {}: {}°F, wind {} {}, {}.",
            period.name,
            period.temperature_f,
            period.wind_direction,
            period.wind_speed,
            period.short_forecast
        ));
    }
    if let Some(alerts) = &signals.alerts {
        for alert in alerts {
            notes.push(format!("Active alert: {} ({}).", alert.event, alert.headline));
        }
    }

    let wetsuit = signals.water_temp_c.map(|c| {
        format!(
            "Water {:.0}°F: {}.",
            crate::units::celsius_to_fahrenheit(c),
            wetsuit_recommendation(c)
        )
    });

    let discrepancy = if assessment.crosscheck.discrepancies.is_empty() {
        None
    } else {
        Some(assessment.crosscheck.discrepancies.join(" "))
    };

    SessionReport {
        spot: spot.name.clone(),
        regime,
        break_type: spot.break_type,
        evaluated_at: signals.local(signals.evaluated_at),
        overall: assessment.overall,
        factors: assessment.factors,
        overrides: assessment.fired,
        safety,
        best_window: assessment.best_window,
        current_conditions: assessment.crosscheck.current_conditions,
        conditions_source: assessment.crosscheck.source,
        discrepancy,
        estimated_surf_ft: assessment.estimated_surf_ft,
        wetsuit,
        outlook: assessment.outlook,
        notes,
        data_gaps: signals.data_gaps.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SurfError, TidePrediction, TideSeries, Wind};
    use chrono::TimeZone;

    fn factors(ratings: &[Rating]) -> Vec<FactorRating> {
        ratings
            .iter()
            .map(|&r| FactorRating::rated(FactorKind::Swell, r))
            .collect()
    }

    fn hourly(start: DateTime<Utc>, winds: &[f64]) -> Vec<ForecastSample> {
        winds
            .iter()
            .enumerate()
            .map(|(i, &speed_mph)| ForecastSample {
                time: start + Duration::hours(i as i64),
                primary_swell: None,
                secondary_swell: None,
                sea: None,
                wind: Some(Wind {
                    speed_mph,
                    from_deg: Some(270.0),
                }),
                sea_level_ft: None,
            })
            .collect()
    }

    fn signals_with(forecast: Vec<ForecastSample>, at: DateTime<Utc>) -> NormalizedSignals {
        NormalizedSignals {
            evaluated_at: at,
            utc_offset: FixedOffset::east_opt(0).unwrap(),
            sample: Err(SurfError::Invalid("unused".into())),
            forecast,
            wind: None,
            wind_from_buoy: false,
            buoy: None,
            water_temp_c: None,
            tides: None,
            alerts: None,
            weather: None,
            notes: Vec::new(),
            data_gaps: Vec::new(),
        }
    }

    #[test]
    fn test_central_rating_mean_rounds_half_down() {
        assert_eq!(central_rating(&factors(&[Rating::Good, Rating::Epic])), Some(Rating::Good));
        assert_eq!(
            central_rating(&factors(&[Rating::Epic, Rating::Epic, Rating::Good])),
            Some(Rating::Epic)
        );
        assert_eq!(
            central_rating(&factors(&[Rating::Poor, Rating::Fair, Rating::Epic])),
            Some(Rating::Fair)
        );
        assert_eq!(central_rating(&factors(&[Rating::Poor])), Some(Rating::Poor));
    }

    #[test]
    fn test_central_rating_ignores_unrated_factors() {
        let mut list = factors(&[Rating::Good]);
        list.push(FactorRating::not_rated(FactorKind::Tide, "none"));
        assert_eq!(central_rating(&list), Some(Rating::Good));
        assert_eq!(central_rating(&[FactorRating::not_rated(FactorKind::Tide, "none")]), None);
    }

    #[test]
    fn test_wetsuit_bands() {
        assert!(wetsuit_recommendation(26.0).contains("Boardshorts"));
        assert!(wetsuit_recommendation(18.0).contains("3/2"));
        assert!(wetsuit_recommendation(4.0).contains("6/5"));
    }

    #[test]
    fn test_ocean_window_without_tides_uses_light_wind_run() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut winds = vec![15.0; 24];
        for w in winds.iter_mut().skip(6).take(4) {
            *w = 4.0;
        }
        let signals = signals_with(hourly(start, &winds), start + Duration::hours(12));
        let window = ocean_window(&signals).unwrap();
        assert_eq!(window.start.with_timezone(&Utc), start + Duration::hours(6));
        assert_eq!(window.end.with_timezone(&Utc), start + Duration::hours(10));
    }

    #[test]
    fn test_ocean_window_prefers_daylight_low_tide() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut signals = signals_with(Vec::new(), at);
        signals.tides = Some(TideSeries {
            station_id: "9410170".into(),
            predictions: vec![
                TidePrediction {
                    time: Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap(),
                    height_ft: -0.4,
                    kind: TideKind::Low,
                },
                TidePrediction {
                    time: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
                    height_ft: 1.2,
                    kind: TideKind::Low,
                },
            ],
        });
        let window = ocean_window(&signals).unwrap();
        assert_eq!(
            window.start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
            "02:00 low is before dawn"
        );
    }

    #[test]
    fn test_lake_window_needs_sustained_blow() {
        let at = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let mut winds = vec![8.0; 72];
        for w in winds.iter_mut().skip(20).take(10) {
            *w = 24.0;
        }
        let signals = signals_with(hourly(at, &winds), at);
        let window = lake_window(&signals).unwrap();
        assert_eq!(window.start.with_timezone(&Utc), at + Duration::hours(26));
        assert_eq!(window.end.with_timezone(&Utc), at + Duration::hours(32));

        let calm = signals_with(hourly(at, &[8.0; 72]), at);
        assert!(lake_window(&calm).is_none());
    }

    #[test]
    fn test_lake_outlook_trend() {
        let start = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let mut winds = vec![10.0; 24];
        winds.extend(vec![22.0; 24]);
        winds.extend(vec![21.0; 24]);
        let signals = signals_with(hourly(start, &winds), start + Duration::hours(12));
        let outlook = lake_outlook(&signals);
        assert_eq!(outlook.len(), 3);
        assert_eq!(outlook[0].trend, None);
        assert_eq!(outlook[1].trend, Some(Trend::Building));
        assert_eq!(outlook[1].rating, Rating::Good);
        assert_eq!(outlook[2].trend, Some(Trend::Stable));
    }
}
