//! CLI entry point for the surf report service.
//!
//! Evaluates one spot or every registered spot, lists the registry, or
//! verifies the configured data sources against the live APIs.

use std::process::ExitCode;
use std::thread;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;

use surf_report_service::analysis::normalize::{EvaluationTarget, NormalizeOptions};
use surf_report_service::analysis::summary::SessionReport;
use surf_report_service::config::ServiceConfig;
use surf_report_service::logging::{self, DataSource, LogLevel};
use surf_report_service::model::SurfError;
use surf_report_service::spots::{Spot, SpotRegistry};
use surf_report_service::{analysis, ingest, report, verify};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Evaluate surf conditions for ocean and lake spots.
#[derive(Parser)]
#[command(name = "surf_report")]
#[command(about = "Evaluate surf conditions for ocean and lake spots")]
struct Cli {
    /// Overrides SURF_LOG_LEVEL (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Evaluate one spot by name, or `all`.
    Evaluate {
        /// Spot name (case-insensitive) or `all`.
        spot: String,

        /// Session day (YYYY-MM-DD), evaluated at the configured local hour.
        #[arg(long, conflicts_with = "at")]
        date: Option<NaiveDate>,

        /// Exact session instant (RFC 3339).
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Print reports as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the registered spots.
    Spots,

    /// Check every configured data source against the live APIs.
    Verify,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Err(e) = logging::init_logger(config.log_level, config.log_file.as_deref(), false) {
        eprintln!("⚠ could not install logger: {}", e);
    }

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            logging::error(DataSource::System, None, &e.to_string());
            eprintln!("✗ {}", e);
            // Bad input (unknown spot, broken registry) is distinct from an
            // upstream outage.
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn load_registry(config: &ServiceConfig) -> Result<SpotRegistry, SurfError> {
    let registry = match &config.spots_file {
        Some(path) => SpotRegistry::load(path)?,
        None => SpotRegistry::builtin()?,
    };
    logging::debug(
        DataSource::Registry,
        None,
        &format!("{} spots registered", registry.len()),
    );
    Ok(registry)
}

fn run(command: Commands, config: &ServiceConfig) -> Result<ExitCode, SurfError> {
    let registry = load_registry(config)?;

    match command {
        Commands::Spots => {
            print!("{}", report::render_spot_list(registry.spots()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify => {
            let client = ingest::build_client(config)?;
            let result = verify::run_verification(&client, &registry);
            verify::print_summary(&result);
            if result.summary.working + result.summary.partial > 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Evaluate { spot, date, at, json } => {
            let spots = registry.lookup(&spot)?;
            let target = match (at, date) {
                (Some(at), _) => EvaluationTarget::At(at),
                (None, Some(date)) => EvaluationTarget::Date(date),
                (None, None) => EvaluationTarget::Now,
            };
            evaluate_spots(&spots, target, config, json)
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Instant used to pick the tide prediction window before the spot's
/// offset is known.
fn fetch_anchor(target: EvaluationTarget, now: DateTime<Utc>) -> DateTime<Utc> {
    match target {
        EvaluationTarget::Now => now,
        EvaluationTarget::At(at) => at,
        EvaluationTarget::Date(date) => date
            .and_hms_opt(12, 0, 0)
            .map(|noon| noon.and_utc())
            .unwrap_or(now),
    }
}

fn evaluate_spots(
    spots: &[&Spot],
    target: EvaluationTarget,
    config: &ServiceConfig,
    as_json: bool,
) -> Result<ExitCode, SurfError> {
    let client = ingest::build_client(config)?;
    let options = NormalizeOptions::from(config);
    let now = Utc::now();
    let anchor = fetch_anchor(target, now);

    logging::info(
        DataSource::System,
        None,
        &format!("Evaluating {} spot(s)", spots.len()),
    );

    // Spots share nothing but the client, so each runs on its own thread.
    let outcomes: Vec<(&Spot, Result<SessionReport, SurfError>)> = thread::scope(|scope| {
        let handles: Vec<_> = spots
            .iter()
            .map(|&spot| {
                let client = &client;
                let options = &options;
                let handle = scope.spawn(move || {
                    let feeds = ingest::fetch_feeds(client, spot, anchor);
                    analysis::evaluate_feeds(spot, feeds, target, now, options)
                });
                (spot, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(spot, handle)| {
                let outcome = handle.join().unwrap_or_else(|_| {
                    Err(SurfError::InsufficientData {
                        spot: spot.name.clone(),
                        detail: "evaluation thread panicked".to_string(),
                    })
                });
                (spot, outcome)
            })
            .collect()
    });

    if as_json {
        let values: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|(spot, outcome)| match outcome {
                Ok(report) => serde_json::to_value(report)
                    .unwrap_or_else(|e| json!({ "spot": spot.name, "error": e.to_string() })),
                Err(err) => json!({ "spot": spot.name, "error": err.to_string() }),
            })
            .collect();
        let text = serde_json::to_string_pretty(&values)
            .map_err(|e| SurfError::Invalid(format!("could not serialize reports: {}", e)))?;
        println!("{}", text);
    } else {
        for (spot, outcome) in &outcomes {
            match outcome {
                Ok(session) => println!("{}", report::render_text(session)),
                Err(err) => println!("{}", report::render_failure(&spot.name, err)),
            }
        }
    }

    let failed = outcomes.iter().filter(|(_, o)| o.is_err()).count();
    for (spot, outcome) in &outcomes {
        if let Err(err) = outcome {
            logging::warn(DataSource::Engine, Some(&spot.name), &err.to_string());
        }
    }
    logging::log_run_summary(outcomes.len(), outcomes.len() - failed, failed);

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
