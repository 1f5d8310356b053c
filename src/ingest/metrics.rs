/// Annual / monthly metric table reader.
///
/// The metric tables are comma-delimited with a header row, one row per
/// station per period:
///
/// ```text
/// Date,site_no,Mean Flow,Peak Flow,Median Flow,Coeff Var,Skew,Tqmean,R-B index,7Q,3xMedian,Station
/// 2015-09-30,3335000,120.5,1500,80,110.2,2.1,0.25,0.31,5.0,240,Wildcat
/// ```
///
/// `Date` and `Station` are required. `site_no` / `agency_cd` are
/// identifiers, not metrics. Every other column is a metric; a value that
/// is blank or not a finite number is stored as `None`.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;

use crate::logging::{self, Stage};
use crate::model::{HydroError, MetricRow};

const COL_DATE: &str = "Date";
const COL_STATION: &str = "Station";
const ID_COLUMNS: &[&str] = &["site_no", "agency_cd"];

/// Parses the `Date` column. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`
/// and `MM/DD/YYYY`.
pub fn parse_metric_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(token, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(token, "%m/%d/%Y").ok())
}

fn parse_metric_value(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a metric table into rows, in file order.
///
/// # Errors
/// - `HydroError::EmptyInput` - no header line.
/// - `HydroError::MalformedRecord` - header lacks `Date` or `Station`, or
///   the CSV itself is unreadable.
///
/// Rows whose date does not parse are skipped.
pub fn parse_metrics_csv(text: &str) -> Result<Vec<MetricRow>, HydroError> {
    if text.trim().is_empty() {
        return Err(HydroError::EmptyInput("metric table has no header".to_string()));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| HydroError::MalformedRecord(format!("metric table header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let date_idx = headers
        .iter()
        .position(|h| h == COL_DATE)
        .ok_or_else(|| HydroError::MalformedRecord("Missing Date column".to_string()))?;
    let station_idx = headers
        .iter()
        .position(|h| h == COL_STATION)
        .ok_or_else(|| HydroError::MalformedRecord("Missing Station column".to_string()))?;

    let metric_columns: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != date_idx && *idx != station_idx && !ID_COLUMNS.contains(&name.as_str())
        })
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0;

    for result in rdr.records() {
        let record = result
            .map_err(|e| HydroError::MalformedRecord(format!("metric table row: {}", e)))?;

        let date = match record.get(date_idx).and_then(parse_metric_date) {
            Some(d) => d,
            None => {
                skipped += 1;
                continue;
            }
        };
        let station = record.get(station_idx).unwrap_or_default().to_string();

        let metrics: BTreeMap<String, Option<f64>> = metric_columns
            .iter()
            .map(|(idx, name)| {
                let value = record.get(*idx).and_then(parse_metric_value);
                ((*name).clone(), value)
            })
            .collect();

        rows.push(MetricRow { station, date, metrics });
    }

    if skipped > 0 {
        logging::warn(
            Stage::Ingest,
            None,
            &format!("Skipped {} metric rows with unparseable dates", skipped),
        );
    }

    Ok(rows)
}

/// Rows for one station label, in their original order.
pub fn rows_for_station(rows: &[MetricRow], station: &str) -> Vec<MetricRow> {
    rows.iter()
        .filter(|r| r.station == station)
        .cloned()
        .collect()
}

/// `(date, value)` pairs of one metric for one station's rows.
pub fn metric_series(rows: &[MetricRow], metric: &str) -> Vec<(NaiveDate, Option<f64>)> {
    rows.iter().map(|r| (r.date, r.get(metric))).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
