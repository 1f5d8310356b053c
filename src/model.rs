/// Observation, ObservationSeries, MetricRow, climatology and return-period
/// types, plus HydroError.
///
/// Core data types for the streamflow climatology pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O - only types and a few small accessors.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Metric names
// ---------------------------------------------------------------------------

/// Monthly/annual mean discharge column in the metric tables.
pub const METRIC_MEAN_FLOW: &str = "Mean Flow";

/// Annual peak discharge column in the annual metric table.
pub const METRIC_PEAK_FLOW: &str = "Peak Flow";

/// USGS daily-value remark codes that stand in for a discharge value.
///
/// `Eqp` = equipment malfunction, `Ice` = ice affected, `Ssn` = seasonal
/// gauge, `Bkw` = backwater, and so on. Any of these in the discharge column
/// means "no data for this day".
pub const DEFAULT_NO_DATA_SENTINELS: &[&str] = &[
    "Eqp", "Ice", "Ssn", "Bkw", "Dis", "Rat", "Mnt", "Fld", "Pr", "ZFl", "Dry", "Tst", "***",
];

// ---------------------------------------------------------------------------
// Water year
// ---------------------------------------------------------------------------

/// Water year (Oct 1 – Sep 30) a date belongs to, labeled by the calendar
/// year in which it ends.
pub fn water_year(date: NaiveDate) -> i32 {
    if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    }
}

// ---------------------------------------------------------------------------
// Daily observations
// ---------------------------------------------------------------------------

/// USGS approval status attached to each daily value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QualityFlag {
    /// `A` - approved for publication.
    Approved,
    /// `A:e` - approved, value estimated.
    ApprovedEstimated,
    /// `P` - provisional, subject to revision.
    Provisional,
    /// `P:e` - provisional, value estimated.
    ProvisionalEstimated,
    /// Flag column was empty.
    Missing,
    /// Any other code, kept verbatim.
    Other(String),
}

impl QualityFlag {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "" => QualityFlag::Missing,
            "A" => QualityFlag::Approved,
            "A:e" => QualityFlag::ApprovedEstimated,
            "P" => QualityFlag::Provisional,
            "P:e" => QualityFlag::ProvisionalEstimated,
            other => QualityFlag::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QualityFlag::Approved => "A",
            QualityFlag::ApprovedEstimated => "A:e",
            QualityFlag::Provisional => "P",
            QualityFlag::ProvisionalEstimated => "P:e",
            QualityFlag::Missing => "",
            QualityFlag::Other(code) => code,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(
            self,
            QualityFlag::ApprovedEstimated | QualityFlag::ProvisionalEstimated
        )
    }
}

/// One tokenized row of a daily-value file, before any interpretation.
///
/// Fields mirror the USGS layout `agency_cd, site_no, datetime, discharge,
/// discharge_cd`. Rows with fewer fields carry empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub agency_code: String,
    pub site_code: String,
    pub date: String,
    pub discharge: String,
    pub quality_flag: String,
}

/// A single cleaned daily discharge observation.
///
/// `discharge` is `None` when the source reported no data for the day. A
/// present value is always finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub discharge: Option<f64>, // cfs
    pub quality_flag: QualityFlag,
}

/// Date-ordered daily observations for one station, one per date.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObservationSeries {
    pub site_code: String,
    pub observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of days with no discharge value.
    pub fn missing_count(&self) -> usize {
        self.observations
            .iter()
            .filter(|o| o.discharge.is_none())
            .count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Present discharge values in date order.
    pub fn discharges(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().filter_map(|o| o.discharge)
    }
}

// ---------------------------------------------------------------------------
// Metric tables
// ---------------------------------------------------------------------------

/// One row of an annual or monthly metric table.
///
/// `date` is only used to recover the period's calendar month/year.
/// A metric that was blank or non-numeric in the source is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub station: String,
    pub date: NaiveDate,
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl MetricRow {
    /// Value of `name`, or `None` if the column is absent or had no value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}

/// Cross-year mean of every metric for one calendar month.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonthlyMean {
    /// Calendar month, 1 = January.
    pub month: u32,
    /// Number of rows that fell into this month's group.
    pub years: usize,
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl MonthlyMean {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}

/// Average annual monthly values, always 12 entries in calendar order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyClimatology {
    pub months: [MonthlyMean; 12],
    /// Rows whose own date disagreed with their water-year block position.
    pub misaligned_rows: usize,
}

impl MonthlyClimatology {
    /// Entry for calendar `month` (1–12).
    pub fn month(&self, month: u32) -> Option<&MonthlyMean> {
        if (1..=12).contains(&month) {
            self.months.get(month as usize - 1)
        } else {
            None
        }
    }

    /// `(month, value)` pairs for one metric, January first.
    pub fn metric(&self, name: &str) -> Vec<(u32, Option<f64>)> {
        self.months.iter().map(|m| (m.month, m.get(name))).collect()
    }
}

// ---------------------------------------------------------------------------
// Return periods
// ---------------------------------------------------------------------------

/// One point of the empirical annual-peak exceedance curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPeriodPoint {
    /// 1 = largest peak.
    pub rank: usize,
    pub exceedance_probability: f64,
    pub magnitude: f64,
}

impl ReturnPeriodPoint {
    /// Average recurrence interval in years, `1 / p`.
    pub fn return_period_years(&self) -> f64 {
        1.0 / self.exceedance_probability
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the ingest and analysis layers.
///
/// Per-row problems are recovered locally (row skipped, value marked absent);
/// only structurally invalid arguments reach the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum HydroError {
    /// Clip window with start after end.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// A record, header or date bound could not be parsed.
    MalformedRecord(String),
    /// Input with no usable content where a table was required.
    EmptyInput(String),
    /// Climatology block length other than 12 months.
    InvalidPeriodLength(usize),
}

impl std::fmt::Display for HydroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HydroError::InvalidRange { start, end } => {
                write!(f, "Invalid range: start {} is after end {}", start, end)
            }
            HydroError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            HydroError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            HydroError::InvalidPeriodLength(n) => {
                write!(f, "Invalid period length: expected 12 periods per year, got {}", n)
            }
        }
    }
}

impl std::error::Error for HydroError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_water_year_starts_in_october() {
        assert_eq!(water_year(date(2014, 9, 30)), 2014);
        assert_eq!(water_year(date(2014, 10, 1)), 2015);
        assert_eq!(water_year(date(2015, 1, 15)), 2015);
    }

    #[test]
    fn test_quality_flag_round_trips_known_codes() {
        for code in ["A", "A:e", "P", "P:e"] {
            assert_eq!(QualityFlag::from_code(code).as_str(), code);
        }
        assert_eq!(QualityFlag::from_code(" "), QualityFlag::Missing);
        assert_eq!(
            QualityFlag::from_code("A:R"),
            QualityFlag::Other("A:R".to_string())
        );
        assert!(QualityFlag::from_code("P:e").is_estimated());
        assert!(!QualityFlag::from_code("A").is_estimated());
    }

    #[test]
    fn test_series_missing_count_counts_absent_days() {
        let series = ObservationSeries {
            site_code: "03335000".to_string(),
            observations: vec![
                Observation { date: date(2020, 1, 1), discharge: Some(10.0), quality_flag: QualityFlag::Approved },
                Observation { date: date(2020, 1, 2), discharge: None, quality_flag: QualityFlag::Approved },
                Observation { date: date(2020, 1, 3), discharge: None, quality_flag: QualityFlag::Missing },
            ],
        };
        assert_eq!(series.missing_count(), 2);
        assert_eq!(series.discharges().collect::<Vec<_>>(), vec![10.0]);
        assert_eq!(series.first_date(), Some(date(2020, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2020, 1, 3)));
    }

    #[test]
    fn test_metric_row_get_flattens_absent_values() {
        let mut metrics = BTreeMap::new();
        metrics.insert(METRIC_MEAN_FLOW.to_string(), Some(12.5));
        metrics.insert("Coeff Var".to_string(), None);
        let row = MetricRow { station: "Wildcat".to_string(), date: date(2015, 10, 31), metrics };

        assert_eq!(row.get(METRIC_MEAN_FLOW), Some(12.5));
        assert_eq!(row.get("Coeff Var"), None);
        assert_eq!(row.get("Tqmean"), None);
    }

    #[test]
    fn test_return_period_years_is_reciprocal_of_probability() {
        let point = ReturnPeriodPoint { rank: 1, exceedance_probability: 0.25, magnitude: 300.0 };
        assert!((point.return_period_years() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_display_mentions_dates() {
        let err = HydroError::InvalidRange { start: date(2020, 1, 2), end: date(2020, 1, 1) };
        let msg = err.to_string();
        assert!(msg.contains("2020-01-02"), "got: {}", msg);
        assert!(msg.contains("2020-01-01"), "got: {}", msg);
    }
}
