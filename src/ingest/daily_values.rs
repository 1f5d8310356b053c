/// Daily discharge ingestion: tokenizing + cleaning.
///
/// `parse_daily_values` splits the text of a USGS daily-value export (or a
/// comma/whitespace-delimited equivalent) into `RawRecord`s without
/// interpreting any field. `load` turns those records into a clean
/// `ObservationSeries`:
///
/// - a no-data sentinel (`Eqp`, `Ice`, …), a blank, a non-finite or an
///   unparseable discharge becomes `None`
/// - a negative discharge is a gross error: the whole row is removed
/// - a row whose date does not parse is skipped
/// - the result is sorted by date with one observation per date; among
///   surviving rows the first occurrence of a date wins
///
/// The column-name and column-format lines of an RDB file are not special
/// cased: their date field (`datetime`, `20d`) does not parse, so they are
/// skipped like any other malformed row.

use chrono::NaiveDate;

use crate::logging::{self, Stage};
use crate::model::{Observation, ObservationSeries, QualityFlag, RawRecord};

/// Date format used by the USGS daily-value service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Tokenizing
// ---------------------------------------------------------------------------

/// Splits one data line into fields.
///
/// Comma-delimited if the line contains a comma, tab-delimited (keeping
/// empty fields) if it contains a tab, otherwise whitespace-delimited.
fn split_fields(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Tokenizes a daily-value text payload into raw records.
///
/// Lines starting with `#` and blank lines are dropped. Every other line
/// becomes a `RawRecord` positionally mapped to
/// `agency_cd, site_no, date, discharge, quality`; missing trailing fields
/// are empty strings.
pub fn parse_daily_values(text: &str) -> Vec<RawRecord> {
    text.lines()
        .filter(|line| !line.trim().starts_with('#') && !line.trim().is_empty())
        .map(|line| {
            let fields = split_fields(line);
            let field = |idx: usize| fields.get(idx).map(|s| s.to_string()).unwrap_or_default();
            RawRecord {
                agency_code: field(0),
                site_code: field(1),
                date: field(2),
                discharge: field(3),
                quality_flag: field(4),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Result of cleaning a set of raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub series: ObservationSeries,
    /// Days with no discharge value in `series`.
    pub missing_count: usize,
    /// Rows skipped because the date did not parse.
    pub malformed_rows: usize,
    /// Rows removed for a negative discharge.
    pub gross_errors_removed: usize,
    /// Later rows dropped because their date was already present.
    pub duplicates_dropped: usize,
}

/// How a discharge token was interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Discharge {
    Value(f64),
    Absent,
    Negative,
}

fn classify_discharge(token: &str, sentinels: &[&str]) -> Discharge {
    let token = token.trim();
    if token.is_empty() || sentinels.contains(&token) {
        return Discharge::Absent;
    }
    match token.parse::<f64>() {
        Ok(v) if !v.is_finite() => Discharge::Absent,
        Ok(v) if v < 0.0 => Discharge::Negative,
        Ok(v) => Discharge::Value(v),
        Err(_) => Discharge::Absent,
    }
}

/// Cleans raw daily records into a date-ordered series.
///
/// `sentinels` are the tokens that mean "no data" in the discharge column
/// (see `model::DEFAULT_NO_DATA_SENTINELS`). Never fails: bad rows are
/// skipped and counted in the returned diagnostics.
pub fn load(records: &[RawRecord], sentinels: &[&str]) -> LoadedSeries {
    let mut observations = Vec::with_capacity(records.len());
    let mut site_code: Option<String> = None;
    let mut malformed_rows = 0;
    let mut gross_errors_removed = 0;

    for record in records {
        let date = match NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT) {
            Ok(d) => d,
            Err(_) => {
                malformed_rows += 1;
                logging::debug(
                    Stage::Ingest,
                    None,
                    &format!("Skipping row with unparseable date '{}'", record.date),
                );
                continue;
            }
        };

        if site_code.is_none() && !record.site_code.is_empty() {
            site_code = Some(record.site_code.clone());
        }

        let discharge = match classify_discharge(&record.discharge, sentinels) {
            Discharge::Value(v) => Some(v),
            Discharge::Absent => None,
            Discharge::Negative => {
                gross_errors_removed += 1;
                continue;
            }
        };

        observations.push(Observation {
            date,
            discharge,
            quality_flag: QualityFlag::from_code(&record.quality_flag),
        });
    }

    // Stable sort keeps input order among equal dates, so dedup keeps the first.
    observations.sort_by_key(|o| o.date);
    let before_dedup = observations.len();
    observations.dedup_by_key(|o| o.date);
    let duplicates_dropped = before_dedup - observations.len();

    let series = ObservationSeries {
        site_code: site_code.unwrap_or_default(),
        observations,
    };
    let missing_count = series.missing_count();
    let site = series.site_code.as_str();

    if gross_errors_removed > 0 {
        logging::warn(
            Stage::Ingest,
            Some(site),
            &format!("Removed {} negative discharge readings", gross_errors_removed),
        );
    }
    if duplicates_dropped > 0 {
        logging::warn(
            Stage::Ingest,
            Some(site),
            &format!("Dropped {} duplicate dates (first occurrence kept)", duplicates_dropped),
        );
    }
    logging::debug(
        Stage::Ingest,
        Some(site),
        &format!(
            "Loaded {} observations ({} missing, {} malformed rows skipped)",
            series.len(),
            missing_count,
            malformed_rows
        ),
    );

    LoadedSeries {
        series,
        missing_count,
        malformed_rows,
        gross_errors_removed,
        duplicates_dropped,
    }
}

/// Tokenizes and loads a daily-value payload in one step.
pub fn load_text(text: &str, sentinels: &[&str]) -> LoadedSeries {
    load(&parse_daily_values(text), sentinels)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
