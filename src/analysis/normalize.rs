//! Signal normalizer: raw feeds in, one evaluation snapshot out.
//!
//! Selects the forecast sample nearest the evaluation time, drops stale
//! buoy readings, filters alerts to those active at the evaluation time
//! and records which feeds were missing. Never fabricates values: an
//! absent forecast sample is carried as the error that explains it.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

use crate::alert::staleness;
use crate::config::ServiceConfig;
use crate::logging::DataSource;
use crate::model::{
    Alert, BuoyObservation, Feed, ForecastSample, RawFeeds, SurfError, TideSeries, WeatherPeriod,
    Wind,
};
use crate::spots::Spot;

/// When to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationTarget {
    Now,
    /// A calendar day local to the spot, evaluated at the session hour.
    Date(NaiveDate),
    At(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub forecast_tolerance: Duration,
    pub buoy_max_age_minutes: u64,
    pub session_hour: u32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for NormalizeOptions {
    fn from(config: &ServiceConfig) -> Self {
        NormalizeOptions {
            forecast_tolerance: Duration::minutes(config.forecast_tolerance_minutes as i64),
            buoy_max_age_minutes: config.buoy_max_age_minutes,
            session_hour: config.session_hour,
        }
    }
}

/// Immutable per-spot snapshot consumed by the raters.
#[derive(Debug, Clone)]
pub struct NormalizedSignals {
    pub evaluated_at: DateTime<Utc>,
    /// Spot-local offset reported by the forecast, UTC when unknown.
    pub utc_offset: FixedOffset,
    /// Forecast sample nearest `evaluated_at`, or why there is none.
    pub sample: Result<ForecastSample, SurfError>,
    /// Full hourly forecast, time-ascending. Empty when unavailable.
    pub forecast: Vec<ForecastSample>,
    /// Forecast wind at the session, or a fresh buoy reading in its place.
    pub wind: Option<Wind>,
    pub wind_from_buoy: bool,
    /// Buoy reading within the staleness window of `evaluated_at`.
    pub buoy: Option<BuoyObservation>,
    /// Water temperature from any buoy reading, stale or not.
    pub water_temp_c: Option<f64>,
    /// Present iff predictions were fetched.
    pub tides: Option<TideSeries>,
    /// Alerts active at `evaluated_at`; `None` when the feed failed.
    pub alerts: Option<Vec<Alert>>,
    pub weather: Option<WeatherPeriod>,
    pub notes: Vec<String>,
    /// Feeds that failed and the error each returned.
    pub data_gaps: Vec<String>,
}

impl NormalizedSignals {
    /// Local wall-clock view of an instant at the spot.
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.utc_offset)
    }
}

/// Resolves the evaluation instant. A bare date uses `session_hour` in the
/// spot's local offset.
pub fn resolve_target(
    target: EvaluationTarget,
    now: DateTime<Utc>,
    offset: FixedOffset,
    session_hour: u32,
) -> DateTime<Utc> {
    match target {
        EvaluationTarget::Now => now,
        EvaluationTarget::At(at) => at,
        EvaluationTarget::Date(date) => date
            .and_hms_opt(session_hour.min(23), 0, 0)
            .and_then(|naive| offset.from_local_datetime(&naive).single())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or(now),
    }
}

/// Sample nearest `at` within `tolerance` (inclusive). Ties go to the
/// earlier sample.
pub fn nearest_sample(
    samples: &[ForecastSample],
    at: DateTime<Utc>,
    tolerance: Duration,
) -> Option<&ForecastSample> {
    let mut best: Option<(&ForecastSample, Duration)> = None;
    for sample in samples {
        let distance = (sample.time - at).abs();
        if distance > tolerance {
            continue;
        }
        // Strictly closer only, so on a tie the earlier sample stays.
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((sample, distance));
        }
    }
    best.map(|(sample, _)| sample)
}

fn record_gap<T>(feed: &Feed<T>, label: &str, gaps: &mut Vec<String>) {
    if let Feed::Unavailable(err) = feed {
        gaps.push(format!("{}: {}", label, err));
    }
}

pub fn normalize(
    spot: &Spot,
    feeds: RawFeeds,
    target: EvaluationTarget,
    now: DateTime<Utc>,
    options: &NormalizeOptions,
) -> NormalizedSignals {
    let mut notes = Vec::new();
    let mut data_gaps = Vec::new();
    record_gap(&feeds.marine, "Marine forecast", &mut data_gaps);
    record_gap(&feeds.buoy, "Buoy", &mut data_gaps);
    record_gap(&feeds.tides, "Tides", &mut data_gaps);
    record_gap(&feeds.alerts, "Alerts", &mut data_gaps);
    record_gap(&feeds.weather, "Weather", &mut data_gaps);

    let utc_offset = feeds
        .marine
        .available()
        .map(|f| f.utc_offset)
        .unwrap_or_else(|| Utc.fix());
    let evaluated_at = resolve_target(target, now, utc_offset, options.session_hour);

    let (forecast, sample) = match feeds.marine {
        Feed::Available(marine) => {
            let sample = nearest_sample(&marine.samples, evaluated_at, options.forecast_tolerance)
                .cloned()
                .ok_or_else(|| SurfError::InsufficientData {
                    spot: spot.name.clone(),
                    detail: format!(
                        "no forecast sample within {} minutes of {}",
                        options.forecast_tolerance.num_minutes(),
                        evaluated_at.format("%Y-%m-%d %H:%M UTC")
                    ),
                });
            (marine.samples, sample)
        }
        Feed::NotApplicable(reason) => (
            Vec::new(),
            Err(SurfError::InsufficientData {
                spot: spot.name.clone(),
                detail: reason,
            }),
        ),
        Feed::Unavailable(err) => (Vec::new(), Err(err)),
    };

    let (buoy, water_temp_c) = match feeds.buoy {
        Feed::Available(obs) => {
            let water = obs.water_temp_c;
            if staleness::is_stale_at(&obs, options.buoy_max_age_minutes, evaluated_at) {
                notes.push(format!(
                    "Buoy {} observation from {} is more than {} minutes from the session; not used for current conditions.",
                    obs.station_id,
                    obs.observed_at.format("%Y-%m-%d %H:%M UTC"),
                    options.buoy_max_age_minutes
                ));
                (None, water)
            } else {
                (Some(obs), water)
            }
        }
        _ => (None, None),
    };

    let forecast_wind = sample.as_ref().ok().and_then(|s| s.wind);
    let buoy_wind = buoy.as_ref().and_then(|obs| {
        obs.wind_speed_mph.map(|speed_mph| Wind {
            speed_mph,
            from_deg: obs.wind_direction_deg,
        })
    });
    let (wind, wind_from_buoy) = match (forecast_wind, buoy_wind) {
        (Some(w), _) => (Some(w), false),
        (None, Some(w)) => {
            notes.push(format!(
                "Forecast wind unavailable; using buoy {} wind reading.",
                buoy.as_ref().map(|b| b.station_id.as_str()).unwrap_or_default()
            ));
            (Some(w), true)
        }
        (None, None) => (None, false),
    };

    let alerts = match feeds.alerts {
        Feed::Available(list) => Some(
            list.into_iter()
                .filter(|alert| alert.is_active_at(evaluated_at))
                .collect(),
        ),
        _ => None,
    };

    let weather = feeds.weather.available().and_then(|periods| {
        periods
            .iter()
            .find(|p| match (p.start, p.end) {
                (Some(start), Some(end)) => start <= evaluated_at && evaluated_at < end,
                _ => false,
            })
            .or_else(|| periods.first())
            .cloned()
    });

    let tides = match feeds.tides {
        Feed::Available(series) => Some(series),
        _ => None,
    };

    if let Err(err) = &sample {
        crate::logging::warn(DataSource::Engine, Some(&spot.name), &err.to_string());
    }

    NormalizedSignals {
        evaluated_at,
        utc_offset,
        sample,
        forecast,
        wind,
        wind_from_buoy,
        buoy,
        water_temp_c,
        tides,
        alerts,
        weather,
        notes,
        data_gaps,
    }
}
