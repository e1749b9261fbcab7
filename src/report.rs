//! Plain-text rendering of session reports and the spot list.

use std::fmt::Write;

use crate::analysis::FactorOutcome;
use crate::analysis::crosscheck::ConditionsSource;
use crate::analysis::summary::SessionReport;
use crate::model::SurfError;
use crate::spots::Spot;
use crate::units;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Renders one report for the terminal. `writeln!` into a `String` cannot
/// fail, so its results are ignored.
pub fn render_text(report: &SessionReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "🌊 {} ({}, {}) for {}",
        report.spot,
        report.regime,
        report.break_type,
        report.evaluated_at.format("%a %b %d %H:%M %:z")
    );
    let _ = writeln!(out, "{}", RULE);

    match report.estimated_surf_ft {
        Some(ft) => {
            let _ = writeln!(out, "Overall: {}   (surf around {:.1} ft)", report.overall, ft);
        }
        None => {
            let _ = writeln!(out, "Overall: {}", report.overall);
        }
    }

    let _ = writeln!(out, "\nFactors:");
    for factor in &report.factors {
        match &factor.outcome {
            FactorOutcome::Rated(rating) => {
                let _ = writeln!(out, "  {:<14} {}", factor.kind.to_string(), rating);
            }
            FactorOutcome::NotRated(reason) => {
                let _ = writeln!(out, "  {:<14} not rated ({})", factor.kind.to_string(), reason);
            }
        }
        for note in &factor.notes {
            let _ = writeln!(out, "      {}", note);
        }
    }

    let capping: Vec<_> = report.overrides.iter().filter(|o| o.cap.is_some()).collect();
    if !capping.is_empty() {
        let _ = writeln!(out, "\nOverrides:");
        for o in capping {
            if let Some(cap) = o.cap {
                let _ = writeln!(out, "  {} (capped at {})", o.name, cap);
            }
        }
    }

    if !report.safety.is_empty() {
        let _ = writeln!(out, "\nSafety:");
        for line in &report.safety {
            let _ = writeln!(out, "  ⚠ {}", line);
        }
    }

    let _ = writeln!(out);
    match &report.best_window {
        Some(window) => {
            let _ = writeln!(
                out,
                "Best window: {} to {}. {}",
                window.start.format("%a %H:%M"),
                window.end.format("%a %H:%M"),
                window.reason
            );
        }
        None => {
            let _ = writeln!(out, "Best window: none identified.");
        }
    }

    let source = match report.conditions_source {
        ConditionsSource::Forecast => "forecast",
        ConditionsSource::Buoy => "buoy",
    };
    let _ = writeln!(out, "Current conditions ({}): {}", source, report.current_conditions);
    if let Some(discrepancy) = &report.discrepancy {
        let _ = writeln!(out, "Discrepancy: {}", discrepancy);
    }
    if let Some(wetsuit) = &report.wetsuit {
        let _ = writeln!(out, "Wetsuit: {}", wetsuit);
    }

    if !report.outlook.is_empty() {
        let _ = writeln!(out, "\nOutlook:");
        for day in &report.outlook {
            let trend = day.trend.map(|t| format!(", {}", t)).unwrap_or_default();
            let _ = writeln!(
                out,
                "  {}  {:<5} median wind {:.0} mph{}",
                day.date.format("%a %b %d"),
                day.rating.to_string(),
                day.median_wind_mph,
                trend
            );
        }
    }

    if !report.notes.is_empty() {
        let _ = writeln!(out, "\nNotes:");
        for note in &report.notes {
            let _ = writeln!(out, "  - {}", note);
        }
    }
    if !report.data_gaps.is_empty() {
        let _ = writeln!(out, "\nData gaps:");
        for gap in &report.data_gaps {
            let _ = writeln!(out, "  - {}", gap);
        }
    }
    out
}

pub fn render_failure(spot: &str, err: &SurfError) -> String {
    format!("{}\n✗ {}: {}\n{}\n", RULE, spot, err, RULE)
}

pub fn render_spot_list(spots: &[Spot]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:<22} {:<6} {:<12} {:<6} {:<8} {:<9}", "Spot", "Location", "Type", "Break", "Facing", "Buoy", "Tide");
    for spot in spots {
        let _ = writeln!(
            out,
            "{:<16} {:<22} {:<6} {:<12} {:<6} {:<8} {:<9}",
            spot.name,
            format!("{}, {}", spot.city, spot.state),
            spot.spot_type.to_string(),
            spot.break_type.to_string(),
            units::degrees_to_compass(spot.facing_deg),
            spot.buoy.as_ref().map(|b| b.id.as_str()).unwrap_or("-"),
            spot.tide_station.as_deref().unwrap_or("-"),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FactorKind;
    use crate::analysis::FactorRating;
    use crate::analysis::regime::Regime;
    use crate::model::{BreakType, Rating};
    use crate::spots::SpotRegistry;
    use chrono::{FixedOffset, TimeZone};

    fn report() -> SessionReport {
        SessionReport {
            spot: "Ocean Beach".into(),
            regime: Regime::Ocean,
            break_type: BreakType::Beach,
            evaluated_at: FixedOffset::west_opt(7 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
                .unwrap(),
            overall: Rating::Fair,
            factors: vec![
                FactorRating::rated(FactorKind::Swell, Rating::Fair).with_note("2.0 ft @ 8 s from WSW."),
                FactorRating::not_rated(FactorKind::Tide, "tide feed unavailable"),
            ],
            overrides: vec![crate::alert::danger_flags::FiredOverride {
                name: "Slushy".into(),
                cap: Some(Rating::Fair),
                annotation: Some("choppy".into()),
            }],
            safety: vec!["choppy".into()],
            best_window: None,
            current_conditions: "Forecast: 2.0 ft @ 8 s.".into(),
            conditions_source: ConditionsSource::Forecast,
            discrepancy: Some("Buoy 46086 wave height 1.2 ft vs forecast 2.0 ft (40% lower).".into()),
            estimated_surf_ft: Some(1.5),
            wetsuit: None,
            outlook: Vec::new(),
            notes: Vec::new(),
            data_gaps: vec!["Tides: TIDE unavailable: HTTP 500 from api.tidesandcurrents.noaa.gov".into()],
        }
    }

    #[test]
    fn test_render_text_sections() {
        let text = render_text(&report());
        assert!(text.contains("Ocean Beach (ocean, beach break)"));
        assert!(text.contains("Overall: Fair"));
        assert!(text.contains("not rated (tide feed unavailable)"));
        assert!(text.contains("Slushy (capped at Fair)"));
        assert!(text.contains("Discrepancy: Buoy 46086"));
        assert!(text.contains("Data gaps:"));
    }

    #[test]
    fn test_spot_list_has_every_spot() {
        let registry = SpotRegistry::builtin().unwrap();
        let text = render_spot_list(registry.spots());
        for spot in registry.spots() {
            assert!(text.contains(&spot.name));
        }
        assert_eq!(text.lines().count(), registry.len() + 1);
    }
}
