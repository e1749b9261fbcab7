/// Upstream feed adapters.
///
/// One module per source. Each separates the HTTP `fetch_*` call from a
/// pure `parse_*` function so payload handling can be tested offline.
/// `fetch_feeds` issues all five fetches for a spot concurrently and
/// joins them into a [`RawFeeds`] snapshot for the engine.
pub mod marine;
pub mod ndbc;
pub mod nws;
pub mod tides;

use std::thread::{self, ScopedJoinHandle};

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::analysis::regime::Regime;
use crate::config::ServiceConfig;
use crate::logging::{self, DataSource};
use crate::model::{Feed, RawFeeds, SurfError};
use crate::spots::Spot;

// ============================================================================
// HTTP helpers
// ============================================================================

/// One client per run, carrying the per-request timeout and User-Agent.
/// NWS rejects requests without a User-Agent.
pub fn build_client(config: &ServiceConfig) -> Result<Client, SurfError> {
    Client::builder()
        .timeout(config.http_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| SurfError::Invalid(format!("could not build HTTP client: {}", e)))
}

fn host_of(url: &str) -> &str {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(url)
}

/// GETs `url` and returns the body; non-2xx responses become
/// `UpstreamUnavailable` tagged with `source`.
pub(crate) fn get_text(client: &Client, source: DataSource, url: &str) -> Result<String, SurfError> {
    logging::debug(source, None, &format!("GET {}", url));
    let response = client
        .get(url)
        .send()
        .map_err(|e| SurfError::upstream(source, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SurfError::upstream(
            source,
            format!("HTTP {} from {}", status.as_u16(), host_of(url)),
        ));
    }
    response
        .text()
        .map_err(|e| SurfError::upstream(source, format!("could not read body: {}", e)))
}

pub(crate) fn parse_json<T: DeserializeOwned>(source: DataSource, body: &str) -> Result<T, SurfError> {
    serde_json::from_str(body).map_err(|e| SurfError::upstream(source, format!("parse error: {}", e)))
}

// ============================================================================
// Concurrent fetch
// ============================================================================

fn join<T>(handle: ScopedJoinHandle<'_, Feed<T>>, source: DataSource, spot: &Spot, operation: &str) -> Feed<T> {
    let feed = handle
        .join()
        .unwrap_or_else(|_| Feed::Unavailable(SurfError::upstream(source, "fetch thread panicked")));
    match &feed {
        Feed::Unavailable(err) => logging::log_fetch_failure(source, &spot.name, operation, &err.to_string()),
        Feed::NotApplicable(reason) => logging::debug(source, Some(&spot.name), &format!("{} skipped: {}", operation, reason)),
        Feed::Available(_) => {}
    }
    feed
}

/// Fetches every feed for `spot` on scoped threads. `around` picks the
/// tide prediction window. Never fails as a whole: each feed carries its
/// own outcome.
pub fn fetch_feeds(client: &Client, spot: &Spot, around: DateTime<Utc>) -> RawFeeds {
    let regime = Regime::of(spot);

    thread::scope(|scope| {
        let marine = scope.spawn(|| marine::fetch_forecast(client, spot, regime));
        let buoy = scope.spawn(|| match &spot.buoy {
            Some(station) => Feed::from(ndbc::fetch_latest(client, station)),
            None => Feed::NotApplicable("no buoy station configured".to_string()),
        });
        let tides = scope.spawn(|| match (regime.rates_tide(), &spot.tide_station) {
            (false, _) => Feed::NotApplicable("lake spots have no tides".to_string()),
            (true, None) => Feed::NotApplicable("no tide station configured".to_string()),
            (true, Some(station)) => Feed::from(tides::fetch_predictions(client, station, around.date_naive())),
        });
        let alerts = scope.spawn(|| Feed::from(nws::fetch_alerts(client, spot.latitude, spot.longitude)));
        let weather = scope.spawn(|| Feed::from(nws::fetch_forecast_periods(client, spot.latitude, spot.longitude)));

        RawFeeds {
            marine: join(marine, DataSource::Marine, spot, "marine forecast"),
            buoy: join(buoy, DataSource::Buoy, spot, "buoy observation"),
            tides: join(tides, DataSource::Tides, spot, "tide predictions"),
            alerts: join(alerts, DataSource::Alerts, spot, "active alerts"),
            weather: join(weather, DataSource::Weather, spot, "gridded forecast"),
        }
    })
}
