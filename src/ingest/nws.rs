//! National Weather Service API: active alerts and gridded forecast.
//!
//! The gridded forecast is a two-step lookup (`/points` gives the office
//! forecast URL) and is routinely missing for marine zones, so it is never
//! essential.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::ingest::{get_text, parse_json};
use crate::logging::DataSource;
use crate::model::{Alert, AlertEvent, AlertSeverity, SurfError, WeatherPeriod};

const NWS_BASE_URL: &str = "https://api.weather.gov";

// ============================================================================
// Response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct AlertCollection {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    event: String,
    headline: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    effective: Option<String>,
    expires: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPeriod {
    name: String,
    start_time: Option<String>,
    end_time: Option<String>,
    temperature: f64,
    #[serde(default)]
    wind_speed: String,
    #[serde(default)]
    wind_direction: String,
    #[serde(default)]
    short_forecast: String,
}

// ============================================================================
// URLs
// ============================================================================

pub fn alerts_url(latitude: f64, longitude: f64) -> String {
    format!("{}/alerts/active?point={:.4},{:.4}", NWS_BASE_URL, latitude, longitude)
}

pub fn points_url(latitude: f64, longitude: f64) -> String {
    format!("{}/points/{:.4},{:.4}", NWS_BASE_URL, latitude, longitude)
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Parses `/alerts/active`. An empty feature list is a valid "no hazards"
/// answer, not a failure.
pub fn parse_alerts(body: &str) -> Result<Vec<Alert>, SurfError> {
    let collection: AlertCollection = parse_json(DataSource::Alerts, body)?;
    Ok(collection
        .features
        .into_iter()
        .map(|feature| {
            let p = feature.properties;
            Alert {
                event: AlertEvent::classify(&p.event),
                severity: AlertSeverity::parse(p.severity.as_deref().unwrap_or("Unknown")),
                headline: p.headline.unwrap_or_else(|| p.event.clone()),
                description: p.description.unwrap_or_default(),
                effective: parse_time(p.effective.as_deref()),
                expires: parse_time(p.expires.as_deref()),
            }
        })
        .collect())
}

pub fn parse_forecast_url(body: &str) -> Result<String, SurfError> {
    let point: PointResponse = parse_json(DataSource::Weather, body)?;
    point
        .properties
        .forecast
        .ok_or_else(|| SurfError::upstream(DataSource::Weather, "no gridded forecast for this point"))
}

pub fn parse_periods(body: &str) -> Result<Vec<WeatherPeriod>, SurfError> {
    let forecast: ForecastResponse = parse_json(DataSource::Weather, body)?;
    if forecast.properties.periods.is_empty() {
        return Err(SurfError::upstream(DataSource::Weather, "forecast has no periods"));
    }
    Ok(forecast
        .properties
        .periods
        .into_iter()
        .map(|p| WeatherPeriod {
            start: parse_time(p.start_time.as_deref()),
            end: parse_time(p.end_time.as_deref()),
            name: p.name,
            temperature_f: p.temperature.round() as i32,
            wind_speed: p.wind_speed,
            wind_direction: p.wind_direction,
            short_forecast: p.short_forecast,
        })
        .collect())
}

// ============================================================================
// Fetch
// ============================================================================

pub fn fetch_alerts(client: &Client, latitude: f64, longitude: f64) -> Result<Vec<Alert>, SurfError> {
    let body = get_text(client, DataSource::Alerts, &alerts_url(latitude, longitude))?;
    parse_alerts(&body)
}

pub fn fetch_forecast_periods(client: &Client, latitude: f64, longitude: f64) -> Result<Vec<WeatherPeriod>, SurfError> {
    let point = get_text(client, DataSource::Weather, &points_url(latitude, longitude))?;
    let forecast_url = parse_forecast_url(&point)?;
    let body = get_text(client, DataSource::Weather, &forecast_url)?;
    parse_periods(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALERTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"properties": {
                "event": "Gale Warning",
                "headline": "Gale Warning issued November 2 at 3:00AM CDT",
                "description": "Northeast winds 25 to 35 kt.",
                "severity": "Moderate",
                "effective": "2024-11-02T03:00:00-05:00",
                "expires": "2024-11-03T04:00:00-05:00"
            }},
            {"properties": {
                "event": "Beach Hazards Statement",
                "headline": null,
                "description": null,
                "severity": null,
                "effective": null,
                "expires": null
            }}
        ]
    }"#;

    const PERIODS: &str = r#"{"properties": {"periods": [
        {"number": 1, "name": "Today",
         "startTime": "2024-05-01T06:00:00-07:00", "endTime": "2024-05-01T18:00:00-07:00",
         "temperature": 68, "windSpeed": "5 to 10 mph", "windDirection": "W",
         "shortForecast": "Patchy Fog then Sunny"}
    ]}}"#;

    #[test]
    fn test_parse_alerts() {
        let alerts = parse_alerts(ALERTS).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].event, AlertEvent::GaleWarning);
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);
        assert_eq!(
            alerts[0].effective,
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 8, 0, 0).unwrap())
        );
        assert_eq!(alerts[1].event, AlertEvent::Other("Beach Hazards Statement".into()));
        assert_eq!(alerts[1].severity, AlertSeverity::Unknown);
        assert_eq!(alerts[1].headline, "Beach Hazards Statement");
    }

    #[test]
    fn test_empty_alert_collection_is_valid() {
        assert_eq!(parse_alerts(r#"{"features": []}"#).unwrap(), Vec::new());
    }

    #[test]
    fn test_points_without_forecast_url() {
        assert!(parse_forecast_url(r#"{"properties": {"forecast": null}}"#).is_err());
        assert_eq!(
            parse_forecast_url(r#"{"properties": {"forecast": "https://api.weather.gov/gridpoints/SGX/56,14/forecast"}}"#)
                .unwrap(),
            "https://api.weather.gov/gridpoints/SGX/56,14/forecast"
        );
    }

    #[test]
    fn test_parse_periods() {
        let periods = parse_periods(PERIODS).unwrap();
        assert_eq!(periods[0].name, "Today");
        assert_eq!(periods[0].temperature_f, 68);
        assert_eq!(periods[0].start, Some(Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()));
    }
}
