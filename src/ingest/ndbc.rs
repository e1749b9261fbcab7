//! NDBC realtime buoy client.
//!
//! The realtime2 text product is whitespace-separated, newest row first,
//! with two `#` header lines and `MM` for missing values:
//!
//! ```text
//! #YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
//! #yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
//! 2024 05 01 14 50 280  5.0  6.0   1.2    14   7.9 265 1015.2  16.1  17.3  11.2   MM   MM    MM
//! ```
//!
//! Shore (C-MAN) stations have the same layout but never report waves.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;

use crate::ingest::get_text;
use crate::logging::DataSource;
use crate::model::{BuoyKind, BuoyObservation, BuoyWaves, SurfError};
use crate::spots::BuoyStation;
use crate::units;

const NDBC_BASE_URL: &str = "https://www.ndbc.noaa.gov/data/realtime2";

const COL_WDIR: usize = 5;
const COL_WSPD: usize = 6;
const COL_GST: usize = 7;
const COL_WVHT: usize = 8;
const COL_DPD: usize = 9;
const COL_MWD: usize = 11;
const COL_WTMP: usize = 14;
const MIN_COLUMNS: usize = 15;

/// One parsed row, still in NDBC units (m, m/s).
#[derive(Debug, Clone, PartialEq)]
struct Row {
    observed_at: DateTime<Utc>,
    wind_direction_deg: Option<f64>,
    wind_speed_mps: Option<f64>,
    gust_mps: Option<f64>,
    wave_height_m: Option<f64>,
    dominant_period_s: Option<f64>,
    mean_direction_deg: Option<f64>,
    water_temp_c: Option<f64>,
}

impl Row {
    fn has_waves(&self) -> bool {
        self.wave_height_m.is_some() || self.dominant_period_s.is_some()
    }

    fn has_wind(&self) -> bool {
        self.wind_speed_mps.is_some()
    }
}

pub fn realtime_url(station_id: &str) -> String {
    format!("{}/{}.txt", NDBC_BASE_URL, station_id)
}

fn field(fields: &[&str], index: usize) -> Option<f64> {
    match fields.get(index) {
        Some(&"MM") | None => None,
        Some(raw) => raw.parse().ok(),
    }
}

fn parse_row(line: &str) -> Option<Row> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_COLUMNS {
        return None;
    }
    let number = |i: usize| fields[i].parse::<u32>().ok();
    let year = fields[0].parse::<i32>().ok()?;
    let observed_at = NaiveDate::from_ymd_opt(year, number(1)?, number(2)?)?
        .and_hms_opt(number(3)?, number(4)?, 0)?
        .and_utc();

    Some(Row {
        observed_at,
        wind_direction_deg: field(&fields, COL_WDIR),
        wind_speed_mps: field(&fields, COL_WSPD),
        gust_mps: field(&fields, COL_GST),
        wave_height_m: field(&fields, COL_WVHT),
        dominant_period_s: field(&fields, COL_DPD),
        mean_direction_deg: field(&fields, COL_MWD),
        water_temp_c: field(&fields, COL_WTMP),
    })
}

/// Picks the most recent usable reading for `station`.
///
/// Offshore buoys: newest row with wave data, else newest row with wind.
/// Shore stations: newest row with wind or water temperature, waves
/// reported as not applicable.
pub fn parse_realtime(body: &str, station: &BuoyStation) -> Result<BuoyObservation, SurfError> {
    let rows: Vec<Row> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_row)
        .collect();

    let chosen = match station.kind {
        BuoyKind::Offshore => rows
            .iter()
            .find(|r| r.has_waves())
            .or_else(|| rows.iter().find(|r| r.has_wind())),
        BuoyKind::Shore => rows
            .iter()
            .find(|r| r.has_wind() || r.water_temp_c.is_some()),
    };
    let row = chosen.ok_or_else(|| {
        SurfError::upstream(
            DataSource::Buoy,
            format!("no usable observations in realtime data for station {}", station.id),
        )
    })?;

    let waves = match station.kind {
        BuoyKind::Offshore => BuoyWaves::Measured {
            height_ft: row.wave_height_m.map(units::meters_to_feet),
            dominant_period_s: row.dominant_period_s,
            mean_direction_deg: row.mean_direction_deg,
        },
        BuoyKind::Shore => BuoyWaves::NotApplicable,
    };

    Ok(BuoyObservation {
        station_id: station.id.clone(),
        kind: station.kind,
        observed_at: row.observed_at,
        wind_speed_mph: row.wind_speed_mps.map(units::mps_to_mph),
        wind_direction_deg: row.wind_direction_deg,
        gust_mph: row.gust_mps.map(units::mps_to_mph),
        waves,
        water_temp_c: row.water_temp_c,
    })
}

pub fn fetch_latest(client: &Client, station: &BuoyStation) -> Result<BuoyObservation, SurfError> {
    let body = get_text(client, DataSource::Buoy, &realtime_url(&station.id))?;
    parse_realtime(&body, station)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const OFFSHORE: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 05 01 15 00 290  6.0  8.0    MM    MM    MM  MM 1015.0  16.0  17.4    MM   MM   MM    MM
2024 05 01 14 50 280  5.0  6.0   1.2    14   7.9 265 1015.2  16.1  17.3  11.2   MM   MM    MM
2024 05 01 14 40 275  4.0  5.0   1.1    13   7.7 262 1015.3  16.1  17.3  11.2   MM   MM    MM
";

    const SHORE: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 11 02 12 00 160 11.0 14.0    MM    MM    MM  MM 1001.0   6.0   9.5    MM   MM   MM    MM
";

    fn station(id: &str, kind: BuoyKind) -> BuoyStation {
        BuoyStation {
            id: id.to_string(),
            kind,
        }
    }

    #[test]
    fn test_offshore_takes_newest_row_with_waves() {
        let obs = parse_realtime(OFFSHORE, &station("46086", BuoyKind::Offshore)).unwrap();
        assert_eq!(obs.observed_at, Utc.with_ymd_and_hms(2024, 5, 1, 14, 50, 0).unwrap());
        match obs.waves {
            BuoyWaves::Measured {
                height_ft,
                dominant_period_s,
                mean_direction_deg,
            } => {
                assert_eq!(height_ft, Some(3.9));
                assert_eq!(dominant_period_s, Some(14.0));
                assert_eq!(mean_direction_deg, Some(265.0));
            }
            BuoyWaves::NotApplicable => panic!("offshore buoy must report measured waves"),
        }
        assert_eq!(obs.wind_speed_mph, Some(11.2));
        assert_eq!(obs.water_temp_c, Some(17.3));
    }

    #[test]
    fn test_offshore_falls_back_to_wind_row() {
        let wind_only: String = OFFSHORE.lines().take(3).map(|l| format!("{}\n", l)).collect();
        let obs = parse_realtime(&wind_only, &station("46086", BuoyKind::Offshore)).unwrap();
        assert_eq!(obs.wind_speed_mph, Some(13.4));
        assert!(matches!(
            obs.waves,
            BuoyWaves::Measured { height_ft: None, dominant_period_s: None, .. }
        ));
    }

    #[test]
    fn test_shore_station_waves_not_applicable() {
        let obs = parse_realtime(SHORE, &station("SLVM5", BuoyKind::Shore)).unwrap();
        assert_eq!(obs.waves, BuoyWaves::NotApplicable);
        assert_eq!(obs.wind_direction_deg, Some(160.0));
        assert_eq!(obs.gust_mph, Some(31.3));
    }

    #[test]
    fn test_no_usable_rows_is_upstream_error() {
        let headers_only: String = OFFSHORE.lines().take(2).map(|l| format!("{}\n", l)).collect();
        assert!(matches!(
            parse_realtime(&headers_only, &station("46086", BuoyKind::Offshore)),
            Err(SurfError::UpstreamUnavailable { feed: DataSource::Buoy, .. })
        ));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let body = format!("garbage line\n{}", SHORE);
        assert!(parse_realtime(&body, &station("SLVM5", BuoyKind::Shore)).is_ok());
    }
}
