//! NOAA CO-OPS tide predictions (high/low events).
//!
//! Requested in GMT, feet above MLLW, from the day before the session
//! through the day after so the session always sits between two events.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::ingest::{get_text, parse_json};
use crate::logging::DataSource;
use crate::model::{SurfError, TideKind, TidePrediction, TideSeries};

const COOPS_BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub fn predictions_url(station_id: &str, date: NaiveDate) -> String {
    let begin = date - Duration::days(1);
    let end = date + Duration::days(1);
    format!(
        "{}?product=predictions&application=surf_report_service\
         &begin_date={}&end_date={}&datum=MLLW&station={}\
         &time_zone=gmt&interval=hilo&units=english&format=json",
        COOPS_BASE_URL,
        begin.format("%Y%m%d"),
        end.format("%Y%m%d"),
        station_id
    )
}

fn parse_prediction(raw: &RawPrediction) -> Result<TidePrediction, SurfError> {
    let time = NaiveDateTime::parse_from_str(&raw.t, "%Y-%m-%d %H:%M")
        .map_err(|e| SurfError::upstream(DataSource::Tides, format!("bad time '{}': {}", raw.t, e)))?
        .and_utc();
    let height_ft = raw
        .v
        .trim()
        .parse::<f64>()
        .map_err(|_| SurfError::upstream(DataSource::Tides, format!("bad height '{}'", raw.v)))?;
    let kind = match raw.kind.trim() {
        "H" | "HH" => TideKind::High,
        "L" | "LL" => TideKind::Low,
        other => {
            return Err(SurfError::upstream(
                DataSource::Tides,
                format!("unknown tide type '{}'", other),
            ));
        }
    };
    Ok(TidePrediction { time, height_ft, kind })
}

/// Parses a hi/lo predictions payload. CO-OPS reports station problems
/// as an `error` object with HTTP 200.
pub fn parse_predictions(body: &str, station_id: &str) -> Result<TideSeries, SurfError> {
    let response: PredictionsResponse = parse_json(DataSource::Tides, body)?;
    if let Some(error) = response.error {
        return Err(SurfError::upstream(
            DataSource::Tides,
            format!("station {}: {}", station_id, error.message.trim()),
        ));
    }

    let mut predictions = response
        .predictions
        .iter()
        .map(parse_prediction)
        .collect::<Result<Vec<_>, _>>()?;
    if predictions.is_empty() {
        return Err(SurfError::upstream(
            DataSource::Tides,
            format!("no predictions returned for station {}", station_id),
        ));
    }
    predictions.sort_by_key(|p| p.time);

    Ok(TideSeries {
        station_id: station_id.to_string(),
        predictions,
    })
}

pub fn fetch_predictions(client: &Client, station_id: &str, date: NaiveDate) -> Result<TideSeries, SurfError> {
    let body = get_text(client, DataSource::Tides, &predictions_url(station_id, date))?;
    parse_predictions(&body, station_id)
}
