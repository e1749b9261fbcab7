//! Buoy cross-validation of the forecast.
//!
//! Compares the latest fresh buoy reading with the selected forecast
//! sample. Differences above 20% produce a discrepancy note. When the buoy
//! shows worse conditions than forecast, its values win: they are reported
//! as current conditions and handed back for re-rating. A buoy that shows
//! better conditions never overrides the forecast.

use serde::Serialize;

use crate::analysis::normalize::NormalizedSignals;
use crate::analysis::regime::Regime;
use crate::model::{BuoyKind, BuoyObservation, BuoyWaves, ForecastSample, Swell, Wind};
use crate::units;

/// Relative difference above which a comparison is a discrepancy.
pub const DISCREPANCY_THRESHOLD: f64 = 0.2;
/// Wind differences smaller than this are noise regardless of ratio.
const MIN_WIND_DIFFERENCE_MPH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionsSource {
    Forecast,
    Buoy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCheck {
    pub discrepancies: Vec<String>,
    pub source: ConditionsSource,
    pub current_conditions: String,
    /// Buoy-derived swell, set only when the buoy waves are worse.
    pub buoy_swell: Option<Swell>,
    /// Buoy wind, set only when it is worse for this regime.
    pub buoy_wind: Option<Wind>,
}

/// `|observed - forecast| / forecast`, undefined for a non-positive forecast.
pub fn relative_difference(observed: f64, forecast: f64) -> Option<f64> {
    if forecast <= 0.0 {
        None
    } else {
        Some((observed - forecast).abs() / forecast)
    }
}

fn percent(observed: f64, forecast: f64, diff: f64) -> String {
    let direction = if observed < forecast { "lower" } else { "higher" };
    format!("{:.0}% {}", diff * 100.0, direction)
}

/// The forecast wave a regime's raters use. Ocean rates the primary swell
/// and falls back to the combined sea; lake waves are wind sea, so lake
/// rates the combined sea first.
pub fn rated_swell(regime: Regime, sample: &ForecastSample) -> Option<Swell> {
    match regime {
        Regime::Ocean => sample.primary_swell.or(sample.sea),
        Regime::Lake => sample.sea.or(sample.primary_swell),
    }
}

fn describe_wind(speed: f64, from: Option<f64>) -> String {
    match from {
        Some(deg) => format!("wind {:.0} mph from {}", speed, units::degrees_to_compass(deg)),
        None => format!("wind {:.0} mph", speed),
    }
}

fn describe_forecast(regime: Regime, sample: Option<&ForecastSample>) -> String {
    let Some(sample) = sample else {
        return "no forecast sample for this session".to_string();
    };
    let mut parts = Vec::new();
    if let Some(wave) = rated_swell(regime, sample) {
        parts.push(format!("{:.1} ft @ {:.0} s", wave.height_ft, wave.period_s));
    }
    if let Some(wind) = sample.wind {
        parts.push(describe_wind(wind.speed_mph, wind.from_deg));
    }
    if parts.is_empty() {
        "forecast sample has no wave or wind values".to_string()
    } else {
        parts.join(", ")
    }
}

fn describe_buoy(obs: &BuoyObservation) -> String {
    let mut parts = Vec::new();
    if let BuoyWaves::Measured {
        height_ft: Some(height),
        dominant_period_s,
        ..
    } = obs.waves
    {
        match dominant_period_s {
            Some(period) => parts.push(format!("{:.1} ft @ {:.0} s", height, period)),
            None => parts.push(format!("{:.1} ft", height)),
        }
    }
    if let Some(speed) = obs.wind_speed_mph {
        parts.push(describe_wind(speed, obs.wind_direction_deg));
    }
    if let Some(temp) = obs.water_temp_c {
        parts.push(format!("water {:.0}°F", units::celsius_to_fahrenheit(temp)));
    }
    format!(
        "Buoy {} at {}: {}",
        obs.station_id,
        obs.observed_at.format("%H:%M UTC"),
        if parts.is_empty() {
            "no usable values".to_string()
        } else {
            parts.join(", ")
        }
    )
}

pub fn cross_check(regime: Regime, signals: &NormalizedSignals) -> CrossCheck {
    let sample = signals.sample.as_ref().ok();
    let forecast_text = describe_forecast(regime, sample);

    let Some(buoy) = signals.buoy.as_ref() else {
        return CrossCheck {
            discrepancies: Vec::new(),
            source: ConditionsSource::Forecast,
            current_conditions: format!("Forecast: {}.", forecast_text),
            buoy_swell: None,
            buoy_wind: None,
        };
    };

    let mut discrepancies = Vec::new();
    let mut buoy_swell = None;
    let mut buoy_wind = None;

    // Wave fields: offshore buoys only. Shore stations structurally lack them.
    if let (
        BuoyKind::Offshore,
        BuoyWaves::Measured {
            height_ft,
            dominant_period_s,
            mean_direction_deg,
        },
        Some(wave),
    ) = (buoy.kind, buoy.waves, sample.and_then(|s| rated_swell(regime, s)))
    {
        let mut waves_worse = false;
        if let Some(observed) = height_ft {
            if let Some(diff) = relative_difference(observed, wave.height_ft) {
                if diff > DISCREPANCY_THRESHOLD {
                    discrepancies.push(format!(
                        "Buoy {} wave height {:.1} ft vs forecast {:.1} ft ({}).",
                        buoy.station_id,
                        observed,
                        wave.height_ft,
                        percent(observed, wave.height_ft, diff)
                    ));
                    waves_worse |= observed < wave.height_ft;
                }
            }
        }
        if let Some(observed) = dominant_period_s {
            if let Some(diff) = relative_difference(observed, wave.period_s) {
                if diff > DISCREPANCY_THRESHOLD {
                    discrepancies.push(format!(
                        "Buoy {} dominant period {:.0} s vs forecast {:.0} s ({}).",
                        buoy.station_id,
                        observed,
                        wave.period_s,
                        percent(observed, wave.period_s, diff)
                    ));
                    waves_worse |= observed < wave.period_s;
                }
            }
        }
        if waves_worse {
            buoy_swell = Some(Swell {
                height_ft: height_ft.unwrap_or(wave.height_ft).min(wave.height_ft),
                period_s: dominant_period_s.unwrap_or(wave.period_s).min(wave.period_s),
                direction_deg: mean_direction_deg.unwrap_or(wave.direction_deg),
            });
        }
    }

    // Wind: every station kind. Skip when the session wind already is the buoy's.
    if let (false, Some(forecast), Some(observed)) = (
        signals.wind_from_buoy,
        sample.and_then(|s| s.wind),
        buoy.wind_speed_mph,
    ) {
        let gap = (observed - forecast.speed_mph).abs();
        let diff = relative_difference(observed, forecast.speed_mph);
        let significant = gap >= MIN_WIND_DIFFERENCE_MPH
            && diff.is_none_or(|d| d > DISCREPANCY_THRESHOLD);
        if significant {
            discrepancies.push(format!(
                "Buoy {} wind {:.0} mph vs forecast {:.0} mph.",
                buoy.station_id, observed, forecast.speed_mph
            ));
            let worse = match regime {
                Regime::Ocean => observed > forecast.speed_mph,
                Regime::Lake => observed < forecast.speed_mph,
            };
            if worse {
                buoy_wind = Some(Wind {
                    speed_mph: observed,
                    from_deg: buoy.wind_direction_deg.or(forecast.from_deg),
                });
            }
        }
    }

    let prefer_buoy = buoy_swell.is_some() || buoy_wind.is_some() || sample.is_none();
    let (source, current_conditions) = if prefer_buoy {
        let suffix = if sample.is_some() {
            " Observed conditions are worse than forecast; going with the buoy."
        } else {
            ""
        };
        (
            ConditionsSource::Buoy,
            format!("{}.{}", describe_buoy(buoy), suffix),
        )
    } else {
        (
            ConditionsSource::Forecast,
            format!("Forecast: {}. {}.", forecast_text, describe_buoy(buoy)),
        )
    };

    CrossCheck {
        discrepancies,
        source,
        current_conditions,
        buoy_swell,
        buoy_wind,
    }
}
