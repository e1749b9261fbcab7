//! Structured logging for the surf report service.
//!
//! Installs a `log` backend that tags each line with the data source
//! (the record target) and, through the helpers below, the spot being
//! evaluated. Supports console output and an append-only log file.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    Marine,
    Buoy,
    Tides,
    Alerts,
    Weather,
    Registry,
    Engine,
    System,
}

impl DataSource {
    /// Used as the `log` record target.
    pub fn target(self) -> &'static str {
        match self {
            DataSource::Marine => "MARINE",
            DataSource::Buoy => "BUOY",
            DataSource::Tides => "TIDE",
            DataSource::Alerts => "ALERTS",
            DataSource::Weather => "NWS",
            DataSource::Registry => "SPOTS",
            DataSource::Engine => "ENGINE",
            DataSource::System => "SYS",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target())
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected - source not configured for this spot, or structurally absent
    Expected,
    /// Unexpected - server errors or payloads we could not parse
    Unexpected,
    /// Unknown - timeouts and anything we cannot place
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies a fetch failure message.
///
/// NWS gridded forecasts regularly 404 for lake and near-shore
/// coordinates that fall in marine zones, so those are expected.
pub fn classify_fetch_failure(source: DataSource, error_msg: &str) -> FailureType {
    let lower = error_msg.to_ascii_lowercase();

    if lower.contains("not configured") || lower.contains("not applicable") {
        return FailureType::Expected;
    }
    if source == DataSource::Weather && lower.contains("http 404") {
        return FailureType::Expected;
    }
    if lower.contains("http 5") || lower.contains("parse") || lower.contains("malformed") {
        return FailureType::Unexpected;
    }
    FailureType::Unknown
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file, opened in append mode per line
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
    file_lock: Mutex<()>,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.min_level.filter()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        };
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let log_entry = format!("{} {} {}: {}", timestamp, level, record.target(), record.args());

        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}: {}", record.target(), record.args()),
                LogLevel::Warning => eprintln!("   ⚠ {}: {}", record.target(), record.args()),
                LogLevel::Info | LogLevel::Debug => eprintln!("   {}", record.args()),
            }
        }

        if let Some(ref path) = self.log_file {
            let _guard = self.file_lock.lock();
            if let Err(e) = append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn flush(&self) {}
}

fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", entry)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Installs the global logger. Fails if a logger is already installed.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> Result<(), log::SetLoggerError> {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
        file_lock: Mutex::new(()),
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(min_level.filter());
    Ok(())
}

fn with_spot(spot: Option<&str>, message: &str) -> String {
    match spot {
        Some(name) => format!("[{}] {}", name, message),
        None => message.to_string(),
    }
}

pub fn info(source: DataSource, spot: Option<&str>, message: &str) {
    log::info!(target: source.target(), "{}", with_spot(spot, message));
}

pub fn warn(source: DataSource, spot: Option<&str>, message: &str) {
    log::warn!(target: source.target(), "{}", with_spot(spot, message));
}

pub fn error(source: DataSource, spot: Option<&str>, message: &str) {
    log::error!(target: source.target(), "{}", with_spot(spot, message));
}

pub fn debug(source: DataSource, spot: Option<&str>, message: &str) {
    log::debug!(target: source.target(), "{}", with_spot(spot, message));
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a data source failure with automatic classification
pub fn log_fetch_failure(source: DataSource, spot: &str, operation: &str, error_msg: &str) {
    let failure_type = classify_fetch_failure(source, error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(source, Some(spot), &message),
        FailureType::Unexpected => error(source, Some(spot), &message),
        FailureType::Unknown => warn(source, Some(spot), &message),
    }
}

/// Log how many spot evaluations in a run produced a report
pub fn log_run_summary(total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Evaluation complete: {}/{} reported, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(DataSource::Engine, None, &message);
    } else if successful == 0 {
        error(DataSource::Engine, None, &message);
    } else {
        warn(DataSource::Engine, None, &message);
    }
}
