//! Data Source Verification Module
//!
//! Checks every registered spot's configured sources against the live APIs
//! to show which stations and endpoints are reachable and returning data.
//!
//! Use this before adding a spot to the registry.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::alert::staleness;
use crate::analysis::regime::Regime;
use crate::config::DEFAULT_BUOY_MAX_AGE_MINUTES;
use crate::ingest::{get_text, marine, ndbc, nws, tides};
use crate::logging::DataSource;
use crate::model::{BuoyObservation, BuoyWaves};
use crate::spots::{Spot, SpotRegistry};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub results: Vec<SourceVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub partial: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceVerification {
    pub spot: String,
    pub source: DataSource,
    /// Station id or endpoint checked.
    pub target: String,
    pub status: VerificationStatus,
    pub sample_data_count: usize,
    pub detail: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl SourceVerification {
    fn new(spot: &Spot, source: DataSource, target: impl Into<String>) -> SourceVerification {
        SourceVerification {
            spot: spot.name.clone(),
            source,
            target: target.into(),
            status: VerificationStatus::Failed,
            sample_data_count: 0,
            detail: None,
            error_message: None,
        }
    }
}

// ============================================================================
// Per-source checks
// ============================================================================

/// Both Open-Meteo endpoints. Partial when only the one the spot's regime
/// depends on answers.
pub fn verify_marine(client: &Client, spot: &Spot) -> SourceVerification {
    let mut result = SourceVerification::new(spot, DataSource::Marine, "open-meteo");

    let waves = get_text(client, DataSource::Marine, &marine::marine_url(spot.latitude, spot.longitude))
        .and_then(|body| marine::parse_marine(&body));
    let wind = get_text(client, DataSource::Marine, &marine::wind_url(spot.latitude, spot.longitude))
        .and_then(|body| marine::parse_wind(&body));

    let essential_ok = match Regime::of(spot) {
        Regime::Ocean => waves.is_ok(),
        Regime::Lake => wind.is_ok(),
    };
    result.sample_data_count = waves.as_ref().map(|f| f.samples.len()).unwrap_or(0)
        + wind.as_ref().map(|w| w.points.len()).unwrap_or(0);

    let errors: Vec<String> = [waves.err(), wind.err()]
        .into_iter()
        .flatten()
        .map(|e| e.to_string())
        .collect();
    result.status = match (errors.is_empty(), essential_ok) {
        (true, _) => VerificationStatus::Success,
        (false, true) => VerificationStatus::PartialSuccess,
        (false, false) => VerificationStatus::Failed,
    };
    if !errors.is_empty() {
        result.error_message = Some(errors.join("; "));
    }
    result
}

/// Offshore buoys without any wave reading are partial. Shore stations
/// never report waves, so wind alone is a success.
pub fn buoy_status(obs: &BuoyObservation) -> VerificationStatus {
    match obs.waves {
        BuoyWaves::NotApplicable => VerificationStatus::Success,
        BuoyWaves::Measured {
            height_ft: Some(_), ..
        } => VerificationStatus::Success,
        BuoyWaves::Measured { .. } => VerificationStatus::PartialSuccess,
    }
}

pub fn verify_buoy(client: &Client, spot: &Spot) -> Option<SourceVerification> {
    let station = spot.buoy.as_ref()?;
    let mut result = SourceVerification::new(spot, DataSource::Buoy, station.id.clone());
    match ndbc::fetch_latest(client, station) {
        Ok(obs) => {
            result.status = buoy_status(&obs);
            result.sample_data_count = 1;
            result.detail = Some(format!("latest reading {}", obs.observed_at.format("%Y-%m-%d %H:%M UTC")));
            if staleness::is_stale(&obs, DEFAULT_BUOY_MAX_AGE_MINUTES) {
                result.status = VerificationStatus::PartialSuccess;
                result.error_message = Some(format!(
                    "latest reading is over {} minutes old",
                    DEFAULT_BUOY_MAX_AGE_MINUTES
                ));
            }
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }
    Some(result)
}

pub fn verify_tides(client: &Client, spot: &Spot, now: DateTime<Utc>) -> Option<SourceVerification> {
    if !Regime::of(spot).rates_tide() {
        return None;
    }
    let station = spot.tide_station.as_ref()?;
    let mut result = SourceVerification::new(spot, DataSource::Tides, station.clone());
    match tides::fetch_predictions(client, station, now.date_naive()) {
        Ok(series) => {
            result.status = VerificationStatus::Success;
            result.sample_data_count = series.predictions.len();
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }
    Some(result)
}

pub fn verify_alerts(client: &Client, spot: &Spot) -> SourceVerification {
    let mut result = SourceVerification::new(
        spot,
        DataSource::Alerts,
        format!("{:.4},{:.4}", spot.latitude, spot.longitude),
    );
    match nws::fetch_alerts(client, spot.latitude, spot.longitude) {
        Ok(alerts) => {
            result.status = VerificationStatus::Success;
            result.sample_data_count = alerts.len();
            result.detail = Some(format!("{} active", alerts.len()));
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }
    result
}

pub fn verify_weather(client: &Client, spot: &Spot) -> SourceVerification {
    let mut result = SourceVerification::new(
        spot,
        DataSource::Weather,
        format!("{:.4},{:.4}", spot.latitude, spot.longitude),
    );
    match nws::fetch_forecast_periods(client, spot.latitude, spot.longitude) {
        Ok(periods) => {
            result.status = VerificationStatus::Success;
            result.sample_data_count = periods.len();
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }
    result
}

// ============================================================================
// Full run
// ============================================================================

pub fn tally(results: &[SourceVerification]) -> VerificationSummary {
    let mut summary = VerificationSummary {
        total: results.len(),
        ..VerificationSummary::default()
    };
    for result in results {
        match result.status {
            VerificationStatus::Success => summary.working += 1,
            VerificationStatus::PartialSuccess => summary.partial += 1,
            VerificationStatus::Failed => summary.failed += 1,
        }
    }
    summary
}

fn print_result(result: &SourceVerification) {
    print!("  {:<7} {:<18} ... ", result.source.target(), result.target);
    match result.status {
        VerificationStatus::Success => {
            println!("✓ OK ({} records)", result.sample_data_count);
        }
        VerificationStatus::PartialSuccess => {
            println!(
                "⚠ Partial: {}",
                result.error_message.as_deref().unwrap_or("no wave data")
            );
        }
        VerificationStatus::Failed => {
            println!("✗ FAILED: {}", result.error_message.as_deref().unwrap_or("Unknown"));
        }
    }
}

pub fn run_verification(client: &Client, registry: &SpotRegistry) -> VerificationReport {
    let now = Utc::now();
    let mut results = Vec::new();

    for spot in registry.spots() {
        println!("\n🔍 {} ({})", spot.name, Regime::of(spot));
        let mut checks = vec![verify_marine(client, spot)];
        checks.extend(verify_buoy(client, spot));
        checks.extend(verify_tides(client, spot, now));
        checks.push(verify_alerts(client, spot));
        checks.push(verify_weather(client, spot));
        for check in &checks {
            print_result(check);
        }
        results.extend(checks);
    }

    VerificationReport {
        timestamp: now.to_rfc3339(),
        summary: tally(&results),
        results,
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for source in [
        DataSource::Marine,
        DataSource::Buoy,
        DataSource::Tides,
        DataSource::Alerts,
        DataSource::Weather,
    ] {
        let of_source: Vec<SourceVerification> = report
            .results
            .iter()
            .filter(|r| r.source == source)
            .cloned()
            .collect();
        if of_source.is_empty() {
            continue;
        }
        let s = tally(&of_source);
        println!(
            "{:<8} {}/{} working  ({} partial, {} failed)",
            source.target(),
            s.working,
            s.total,
            s.partial,
            s.failed
        );
    }
    println!();

    let usable = report.summary.working + report.summary.partial;
    let success_rate = if report.summary.total > 0 {
        (usable as f64 / report.summary.total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Overall Success Rate: {:.1}% ({}/{})",
        success_rate, usable, report.summary.total
    );
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuoyKind;

    fn observation(waves: BuoyWaves) -> BuoyObservation {
        BuoyObservation {
            station_id: "46086".into(),
            kind: BuoyKind::Offshore,
            observed_at: Utc::now(),
            wind_speed_mph: Some(8.0),
            wind_direction_deg: Some(270.0),
            gust_mph: None,
            waves,
            water_temp_c: None,
        }
    }

    #[test]
    fn test_shore_station_without_waves_is_success() {
        assert_eq!(buoy_status(&observation(BuoyWaves::NotApplicable)), VerificationStatus::Success);
    }

    #[test]
    fn test_offshore_without_wave_height_is_partial() {
        let obs = observation(BuoyWaves::Measured {
            height_ft: None,
            dominant_period_s: None,
            mean_direction_deg: None,
        });
        assert_eq!(buoy_status(&obs), VerificationStatus::PartialSuccess);
    }

    #[test]
    fn test_tally_counts_each_status() {
        let registry = SpotRegistry::builtin().unwrap();
        let spot = &registry.spots()[0];
        let mut ok = SourceVerification::new(spot, DataSource::Alerts, "x");
        ok.status = VerificationStatus::Success;
        let mut partial = SourceVerification::new(spot, DataSource::Marine, "x");
        partial.status = VerificationStatus::PartialSuccess;
        let failed = SourceVerification::new(spot, DataSource::Weather, "x");

        assert_eq!(
            tally(&[ok, partial, failed]),
            VerificationSummary {
                total: 3,
                working: 1,
                partial: 1,
                failed: 1,
            }
        );
    }
}
