//! Open-Meteo marine and wind forecast client.
//!
//! Waves come from the marine API, 10 m wind from the weather API. Both
//! return parallel hourly arrays in the spot's local time; the samples
//! are merged by timestamp into one [`MarineForecast`].
//!
//! API Documentation: https://open-meteo.com/en/docs/marine-weather-api

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::analysis::regime::Regime;
use crate::ingest::{get_text, parse_json};
use crate::logging::{self, DataSource};
use crate::model::{Feed, ForecastSample, MarineForecast, SurfError, Swell, Wind};
use crate::spots::Spot;

const MARINE_BASE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";
const WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Past days are needed to measure how long a lake wind has been blowing.
const PAST_DAYS: u32 = 2;
const FORECAST_DAYS: u32 = 4;

// ============================================================================
// Response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct MarineResponse {
    utc_offset_seconds: i32,
    hourly: MarineHourly,
}

#[derive(Debug, Deserialize)]
struct MarineHourly {
    time: Vec<String>,
    #[serde(default)]
    wave_height: Vec<Option<f64>>,
    #[serde(default)]
    wave_period: Vec<Option<f64>>,
    #[serde(default)]
    wave_direction: Vec<Option<f64>>,
    #[serde(default)]
    swell_wave_height: Vec<Option<f64>>,
    #[serde(default)]
    swell_wave_period: Vec<Option<f64>>,
    #[serde(default)]
    swell_wave_direction: Vec<Option<f64>>,
    #[serde(default)]
    secondary_swell_wave_height: Vec<Option<f64>>,
    #[serde(default)]
    secondary_swell_wave_period: Vec<Option<f64>>,
    #[serde(default)]
    secondary_swell_wave_direction: Vec<Option<f64>>,
    #[serde(default)]
    sea_level_height_msl: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct WindResponse {
    utc_offset_seconds: i32,
    hourly: WindHourly,
}

#[derive(Debug, Deserialize)]
struct WindHourly {
    time: Vec<String>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
}

/// Hourly wind parsed from the weather API.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSeries {
    pub utc_offset: FixedOffset,
    pub points: Vec<(DateTime<Utc>, Wind)>,
}

// ============================================================================
// URLs
// ============================================================================

pub fn marine_url(latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={:.4}&longitude={:.4}\
         &hourly=wave_height,wave_direction,wave_period,\
         swell_wave_height,swell_wave_direction,swell_wave_period,\
         secondary_swell_wave_height,secondary_swell_wave_direction,secondary_swell_wave_period,\
         sea_level_height_msl\
         &length_unit=imperial&timezone=auto&past_days={}&forecast_days={}",
        MARINE_BASE_URL, latitude, longitude, PAST_DAYS, FORECAST_DAYS
    )
}

pub fn wind_url(latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={:.4}&longitude={:.4}\
         &hourly=wind_speed_10m,wind_direction_10m\
         &wind_speed_unit=mph&timezone=auto&past_days={}&forecast_days={}",
        WEATHER_BASE_URL, latitude, longitude, PAST_DAYS, FORECAST_DAYS
    )
}

// ============================================================================
// Parsing
// ============================================================================

fn offset_of(source: DataSource, seconds: i32) -> Result<FixedOffset, SurfError> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| SurfError::upstream(source, format!("invalid utc_offset_seconds {}", seconds)))
}

/// Open-Meteo local times look like `2024-05-01T13:00`.
fn parse_local_time(source: DataSource, raw: &str, offset: FixedOffset) -> Result<DateTime<Utc>, SurfError> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map_err(|e| SurfError::upstream(source, format!("bad timestamp '{}': {}", raw, e)))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| SurfError::upstream(source, format!("ambiguous local time '{}'", raw)))
}

fn value(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

/// A partition only counts when height, period and direction are all present.
fn swell_at(heights: &[Option<f64>], periods: &[Option<f64>], directions: &[Option<f64>], i: usize) -> Option<Swell> {
    Some(Swell {
        height_ft: value(heights, i)?,
        period_s: value(periods, i)?,
        direction_deg: value(directions, i)?,
    })
}

/// Parses a marine API response (imperial units requested) into samples
/// without wind.
pub fn parse_marine(body: &str) -> Result<MarineForecast, SurfError> {
    let response: MarineResponse = parse_json(DataSource::Marine, body)?;
    let utc_offset = offset_of(DataSource::Marine, response.utc_offset_seconds)?;
    let h = &response.hourly;

    let mut samples = Vec::with_capacity(h.time.len());
    for (i, raw) in h.time.iter().enumerate() {
        samples.push(ForecastSample {
            time: parse_local_time(DataSource::Marine, raw, utc_offset)?,
            primary_swell: swell_at(&h.swell_wave_height, &h.swell_wave_period, &h.swell_wave_direction, i),
            secondary_swell: swell_at(
                &h.secondary_swell_wave_height,
                &h.secondary_swell_wave_period,
                &h.secondary_swell_wave_direction,
                i,
            ),
            sea: swell_at(&h.wave_height, &h.wave_period, &h.wave_direction, i),
            wind: None,
            sea_level_ft: value(&h.sea_level_height_msl, i),
        });
    }
    if samples.is_empty() {
        return Err(SurfError::upstream(DataSource::Marine, "no hourly samples in response"));
    }
    Ok(MarineForecast { utc_offset, samples })
}

/// Parses the weather API's hourly wind (mph requested).
pub fn parse_wind(body: &str) -> Result<WindSeries, SurfError> {
    let response: WindResponse = parse_json(DataSource::Marine, body)?;
    let utc_offset = offset_of(DataSource::Marine, response.utc_offset_seconds)?;
    let h = &response.hourly;

    let mut points = Vec::new();
    for (i, raw) in h.time.iter().enumerate() {
        let Some(speed_mph) = value(&h.wind_speed_10m, i) else {
            continue;
        };
        points.push((
            parse_local_time(DataSource::Marine, raw, utc_offset)?,
            Wind {
                speed_mph,
                from_deg: value(&h.wind_direction_10m, i),
            },
        ));
    }
    if points.is_empty() {
        return Err(SurfError::upstream(DataSource::Marine, "no hourly wind in response"));
    }
    Ok(WindSeries { utc_offset, points })
}

/// Merges waves and wind by timestamp. Hours present in only one series
/// still produce a sample.
pub fn merge(marine: Option<MarineForecast>, wind: Option<WindSeries>) -> MarineForecast {
    let utc_offset = marine
        .as_ref()
        .map(|m| m.utc_offset)
        .or(wind.as_ref().map(|w| w.utc_offset))
        .unwrap_or_else(|| Utc.fix());

    let mut by_time: BTreeMap<DateTime<Utc>, ForecastSample> = marine
        .map(|m| m.samples.into_iter().map(|s| (s.time, s)).collect())
        .unwrap_or_default();

    for (time, w) in wind.map(|w| w.points).unwrap_or_default() {
        by_time
            .entry(time)
            .or_insert_with(|| ForecastSample {
                time,
                primary_swell: None,
                secondary_swell: None,
                sea: None,
                wind: None,
                sea_level_ft: None,
            })
            .wind = Some(w);
    }

    MarineForecast {
        utc_offset,
        samples: by_time.into_values().collect(),
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// Fetches waves and wind. The ocean regime cannot do without waves and
/// the lake regime cannot do without wind; the other half is optional.
pub fn fetch_forecast(client: &Client, spot: &Spot, regime: Regime) -> Feed<MarineForecast> {
    let marine = get_text(client, DataSource::Marine, &marine_url(spot.latitude, spot.longitude))
        .and_then(|body| parse_marine(&body));
    let wind = get_text(client, DataSource::Marine, &wind_url(spot.latitude, spot.longitude))
        .and_then(|body| parse_wind(&body));

    match (regime, marine, wind) {
        (Regime::Ocean, Err(err), _) => Feed::Unavailable(err),
        (Regime::Lake, _, Err(err)) => Feed::Unavailable(err),
        (_, marine, wind) => {
            if let Err(err) = &marine {
                logging::warn(DataSource::Marine, Some(&spot.name), &format!("wave forecast unavailable: {}", err));
            }
            if let Err(err) = &wind {
                logging::warn(DataSource::Marine, Some(&spot.name), &format!("wind forecast unavailable: {}", err));
            }
            Feed::Available(merge(marine.ok(), wind.ok()))
        }
    }
}
