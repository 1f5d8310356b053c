//! Streamflow Climatology Runner
//!
//! For every station in the run configuration:
//! 1. Loads and cleans the USGS daily-value file
//! 2. Clips it to the common analysis window
//! 3. Averages the monthly metric table into a calendar-month climatology
//! 4. Ranks annual peaks into an empirical exceedance curve
//!
//! Plotting is left to whatever consumes the printed / JSON output.
//!
//! Usage:
//!   cargo run --release                          # uses ./flowclim.toml
//!   cargo run --release -- --config other.toml
//!   cargo run --release -- --json > report.json
//!
//! Environment:
//!   FLOWCLIM_CONFIG - config path (read from .env if present)

use flow_climatology::config::{self, AppConfig, DEFAULT_CONFIG_PATH};
use flow_climatology::ingest::metrics::{parse_metrics_csv, rows_for_station};
use flow_climatology::logging::{self, Stage};
use flow_climatology::model::MetricRow;
use flow_climatology::pipeline::{run_stations, PipelineSettings, StationJob, StationReport};
use std::env;
use std::error::Error;
use std::fs;

fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let mut config_path = env::var("FLOWCLIM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut json_output = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--config PATH] [--json]", args[0]);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = run(&config_path, json_output) {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run(config_path: &str, json_output: bool) -> Result<(), Box<dyn Error>> {
    let config = config::load_config(config_path)?;
    logging::init_logger(
        config.log_level(),
        config.pipeline.log_file.as_deref(),
        false,
    );
    logging::debug(
        Stage::Config,
        None,
        &format!(
            "Window {}..{}, year_span {}, {} workers",
            config.window.start, config.window.end, config.climatology.year_span, config.pipeline.workers
        ),
    );

    if !json_output {
        println!("🌊 Streamflow Climatology");
        println!("=========================\n");
        println!("📋 Loaded {} stations from {}\n", config.station.len(), config_path);
    }

    let settings = PipelineSettings::from_config(&config)?;
    let annual = read_metric_table(&config.metrics.annual)?;
    let monthly = read_metric_table(&config.metrics.monthly)?;
    let jobs = build_jobs(&config, &annual, &monthly);

    let results = run_stations(jobs, &settings, config.pipeline.workers);

    if json_output {
        let reports: Vec<&StationReport> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    for (label, result) in &results {
        match result {
            Ok(report) if !json_output => print_report(report, &config.metrics.climatology_metric),
            Ok(_) => {}
            Err(e) => eprintln!("✗ {} - {}", label, e),
        }
    }

    Ok(())
}

fn read_metric_table(path: &str) -> Result<Vec<MetricRow>, Box<dyn Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    Ok(parse_metrics_csv(&text)?)
}

/// Reads each station's files. A station whose daily file cannot be read is
/// reported and skipped; the others still run.
fn build_jobs(config: &AppConfig, annual: &[MetricRow], monthly: &[MetricRow]) -> Vec<StationJob> {
    let mut jobs = Vec::new();

    for station in &config.station {
        let daily_text = match fs::read_to_string(&station.discharge_file) {
            Ok(text) => text,
            Err(e) => {
                logging::error(
                    Stage::Ingest,
                    Some(&station.label),
                    &format!("Failed to read {}: {}", station.discharge_file, e),
                );
                continue;
            }
        };

        let peak_text = match &station.peak_file {
            Some(path) => match fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    logging::warn(
                        Stage::Ingest,
                        Some(&station.label),
                        &format!("Failed to read {} ({}), using annual metric table", path, e),
                    );
                    None
                }
            },
            None => None,
        };

        jobs.push(StationJob {
            label: station.label.clone(),
            name: station.name.clone(),
            site_code: station.site_code.clone(),
            daily_text,
            peak_text,
            annual_rows: rows_for_station(annual, &station.label),
            monthly_rows: rows_for_station(monthly, &station.label),
        });
    }

    jobs
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_report(report: &StationReport, climatology_metric: &str) {
    println!("{}", "=".repeat(50));
    println!("📍 {} ({}) [{}]", report.name, report.site_code, report.label);
    println!("{}", "=".repeat(50));

    let raw = &report.raw_summary;
    println!("\nRaw record: {} days, {} missing", raw.days, report.load.missing_count);
    println!(
        "   removed {} negative values, {} duplicate dates, {} malformed rows",
        report.load.gross_errors_removed, report.load.duplicates_dropped, report.load.malformed_rows
    );
    println!(
        "   mean {}  std {}  min {}  median {}  max {}",
        fmt_opt(raw.mean), fmt_opt(raw.std), fmt_opt(raw.min), fmt_opt(raw.median), fmt_opt(raw.max)
    );

    let clipped = &report.clipped_summary;
    println!(
        "\nSelected period {}..{}: {} days, {} missing, {} estimated",
        report.window.start, report.window.end, clipped.days, report.clipped_missing, report.clipped_estimated
    );
    println!(
        "   mean {}  std {}  min {}  median {}  max {}",
        fmt_opt(clipped.mean), fmt_opt(clipped.std), fmt_opt(clipped.min), fmt_opt(clipped.median), fmt_opt(clipped.max)
    );

    println!("\nAverage annual monthly {}:", climatology_metric);
    for (month, value) in report.climatology.metric(climatology_metric) {
        println!("   {:>2}  {}", month, fmt_opt(value));
    }

    println!("\nAnnual peak exceedance ({:?}):", report.peak_source);
    println!("   rank   p(exceed)   T (yr)   peak (cfs)");
    for point in &report.return_periods {
        println!(
            "   {:>4}   {:>9.4}   {:>6.1}   {:>10.0}",
            point.rank,
            point.exceedance_probability,
            point.return_period_years(),
            point.magnitude
        );
    }
    println!();
}
