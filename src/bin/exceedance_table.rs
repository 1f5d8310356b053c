//! Annual Peak Exceedance Table
//!
//! Prints the Weibull exceedance curve for one station's annual peaks,
//! read either from the annual metric table or from a USGS peak
//! streamflow export.
//!
//! Usage:
//!   cargo run --bin exceedance_table -- --metrics Annual_Metrics.csv Wildcat
//!   cargo run --bin exceedance_table -- --peaks 03335000_peaks.rdb

use flow_climatology::analysis::return_period::{exceedance_curve, peaks_from_metrics};
use flow_climatology::ingest::metrics::{parse_metrics_csv, rows_for_station};
use flow_climatology::ingest::peak_flow::{annual_peaks, parse_rdb};
use flow_climatology::model::METRIC_PEAK_FLOW;
use std::env;
use std::fs;

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {} --metrics FILE STATION", program);
    eprintln!("  {} --peaks FILE", program);
    std::process::exit(1);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("exceedance_table");

    let peaks: Vec<f64> = match args.get(1).map(String::as_str) {
        Some("--metrics") => {
            let (Some(path), Some(station)) = (args.get(2), args.get(3)) else {
                usage(program);
            };
            let rows = parse_metrics_csv(&fs::read_to_string(path)?)?;
            let station_rows = rows_for_station(&rows, station);
            if station_rows.is_empty() {
                return Err(format!("No rows for station '{}' in {}", station, path).into());
            }
            println!("📍 {} - {} ({} years)\n", station, path, station_rows.len());
            peaks_from_metrics(&station_rows, METRIC_PEAK_FLOW)
        }
        Some("--peaks") => {
            let Some(path) = args.get(2) else {
                usage(program);
            };
            let records = parse_rdb(&fs::read_to_string(path)?)?;
            let site = records.first().map(|r| r.site_code.clone()).unwrap_or_default();
            let by_year = annual_peaks(&records);
            println!("📍 USGS {} - {} ({} water years)\n", site, path, by_year.len());
            by_year.into_iter().map(|(_, q)| q).collect()
        }
        _ => usage(program),
    };

    let curve = exceedance_curve(&peaks);
    if curve.is_empty() {
        println!("No annual peaks available.");
        return Ok(());
    }

    println!("rank   p(exceed)   T (yr)   peak (cfs)");
    for point in &curve {
        println!(
            "{:>4}   {:>9.4}   {:>6.1}   {:>10.0}",
            point.rank,
            point.exceedance_probability,
            point.return_period_years(),
            point.magnitude
        );
    }

    Ok(())
}
