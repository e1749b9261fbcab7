//! Runtime configuration loaded from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;
use crate::model::SurfError;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = "surf_report_service/0.1 (surf condition evaluation)";
pub const DEFAULT_BUOY_MAX_AGE_MINUTES: u64 = 180;
pub const DEFAULT_FORECAST_TOLERANCE_MINUTES: u64 = 90;
pub const DEFAULT_SESSION_HOUR: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Replacement spot registry; `None` uses the built-in `spots.toml`.
    pub spots_file: Option<PathBuf>,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    /// Buoy observations older than this are not trusted.
    pub buoy_max_age_minutes: u64,
    /// How far the nearest forecast sample may sit from the evaluation time.
    pub forecast_tolerance_minutes: u64,
    /// Local hour used when only a date is requested.
    pub session_hour: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            spots_file: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_file: None,
            buoy_max_age_minutes: DEFAULT_BUOY_MAX_AGE_MINUTES,
            forecast_tolerance_minutes: DEFAULT_FORECAST_TOLERANCE_MINUTES,
            session_hour: DEFAULT_SESSION_HOUR,
        }
    }
}

impl ServiceConfig {
    /// Loads `.env` if present, then reads `SURF_*` variables.
    pub fn from_env() -> Result<ServiceConfig, SurfError> {
        dotenv::dotenv().ok();
        ServiceConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<ServiceConfig, SurfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = ServiceConfig::default();

        let http_timeout = match get("SURF_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_number("SURF_HTTP_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(SurfError::Invalid(
                        "SURF_HTTP_TIMEOUT_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        let log_level = match get("SURF_LOG_LEVEL") {
            Some(raw) => raw.parse::<LogLevel>().map_err(SurfError::Invalid)?,
            None => defaults.log_level,
        };

        let session_hour = match get("SURF_SESSION_HOUR") {
            Some(raw) => {
                let hour: u32 = parse_number("SURF_SESSION_HOUR", &raw)?;
                if hour > 23 {
                    return Err(SurfError::Invalid(format!(
                        "SURF_SESSION_HOUR must be 0-23, got {}",
                        hour
                    )));
                }
                hour
            }
            None => defaults.session_hour,
        };

        Ok(ServiceConfig {
            spots_file: get("SURF_SPOTS_FILE").map(PathBuf::from),
            http_timeout,
            user_agent: get("SURF_USER_AGENT").unwrap_or(defaults.user_agent),
            log_level,
            log_file: get("SURF_LOG_FILE"),
            buoy_max_age_minutes: match get("SURF_BUOY_MAX_AGE_MINUTES") {
                Some(raw) => parse_number("SURF_BUOY_MAX_AGE_MINUTES", &raw)?,
                None => defaults.buoy_max_age_minutes,
            },
            forecast_tolerance_minutes: match get("SURF_FORECAST_TOLERANCE_MINUTES") {
                Some(raw) => parse_number("SURF_FORECAST_TOLERANCE_MINUTES", &raw)?,
                None => defaults.forecast_tolerance_minutes,
            },
            session_hour,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SurfError> {
    raw.parse::<T>()
        .map_err(|_| SurfError::Invalid(format!("{} is not a valid number: '{}'", key, raw)))
}
