/// USGS Peak Streamflow Database Parser
///
/// Parses annual peak streamflow data from the USGS NWIS Peak Streamflow
/// database as an alternate source of annual peaks for the exceedance curve.
/// Format: Tab-delimited RDB (Research Data BYte-stream)
/// Source: https://nwis.waterdata.usgs.gov/{state}/nwis/peak?site_no={site}&agency_cd=USGS&format=rdb
///
/// Each row is the highest discharge recorded during one water year
/// (Oct 1 - Sep 30). Historic peaks with an unknown day or month are
/// published with `00` in the date and cannot be placed on a calendar; they
/// are skipped.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::logging::{self, Stage};
use crate::model::{water_year, HydroError};

/// Parsed peak flow record from USGS RDB format
#[derive(Debug, Clone, PartialEq)]
pub struct PeakFlowRecord {
    pub site_code: String,
    pub peak_date: NaiveDate,
    pub peak_discharge_cfs: Option<f64>,
    pub peak_qualification_codes: Vec<String>,
    pub water_year: i32,
}

/// Parse USGS Peak Streamflow RDB format
///
/// RDB format structure:
/// - Lines starting with '#' are comments (metadata header)
/// - First non-comment line: tab-delimited column names
/// - Second non-comment line: tab-delimited format descriptors (e.g., "5s", "10d")
/// - Remaining lines: tab-delimited data rows
///
/// Fields used:
/// - site_no: 8-digit station code
/// - peak_dt: Date (YYYY-MM-DD)
/// - peak_va: Peak discharge (cfs)
/// - peak_cd: Qualification codes (comma-separated)
///
/// # Errors
/// `HydroError::MalformedRecord` when the header or format line is missing
/// or the header lacks `site_no` / `peak_dt`.
pub fn parse_rdb(rdb_text: &str) -> Result<Vec<PeakFlowRecord>, HydroError> {
    let mut data_lines = rdb_text
        .lines()
        .filter(|line| !line.trim().starts_with('#') && !line.trim().is_empty());

    // First non-comment line: column headers
    let header_line = data_lines
        .next()
        .ok_or_else(|| HydroError::MalformedRecord("No header line found in RDB data".to_string()))?;

    let col_map: HashMap<&str, usize> = header_line
        .split('\t')
        .enumerate()
        .map(|(idx, header)| (header.trim(), idx))
        .collect();

    let site_idx = *col_map
        .get("site_no")
        .ok_or_else(|| HydroError::MalformedRecord("Missing site_no column".to_string()))?;
    let date_idx = *col_map
        .get("peak_dt")
        .ok_or_else(|| HydroError::MalformedRecord("Missing peak_dt column".to_string()))?;

    // Second non-comment line: format descriptors (skip)
    data_lines
        .next()
        .ok_or_else(|| HydroError::MalformedRecord("No format line found in RDB data".to_string()))?;

    let mut records = Vec::new();
    let mut skipped = 0;

    for line in data_lines {
        let fields: Vec<&str> = line.split('\t').collect();
        let field = |name: &str| {
            col_map
                .get(name)
                .and_then(|&idx| fields.get(idx))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };

        let peak_date = match fields
            .get(date_idx)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        {
            Some(d) => d,
            None => {
                skipped += 1;
                continue;
            }
        };

        let site_code = fields
            .get(site_idx)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let peak_discharge_cfs = field("peak_va")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        let peak_qualification_codes = field("peak_cd")
            .map(|s| s.split(',').map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();

        records.push(PeakFlowRecord {
            site_code,
            peak_date,
            peak_discharge_cfs,
            peak_qualification_codes,
            water_year: water_year(peak_date),
        });
    }

    if skipped > 0 {
        logging::debug(
            Stage::Ingest,
            None,
            &format!("Skipped {} peak rows without a usable date", skipped),
        );
    }

    Ok(records)
}

/// One peak discharge per water year, in water-year order.
///
/// Records without a discharge are ignored. If a water year appears more
/// than once the largest discharge is kept.
pub fn annual_peaks(records: &[PeakFlowRecord]) -> Vec<(i32, f64)> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();

    for record in records {
        let Some(q) = record.peak_discharge_cfs else {
            continue;
        };
        by_year
            .entry(record.water_year)
            .and_modify(|current| {
                if q > *current {
                    *current = q;
                }
            })
            .or_insert(q);
    }

    by_year.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::fixture_wildcat_peak_rdb;

    fn record(date: (i32, u32, u32), q: Option<f64>) -> PeakFlowRecord {
        let peak_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        PeakFlowRecord {
            site_code: "03335000".to_string(),
            peak_date,
            peak_discharge_cfs: q,
            peak_qualification_codes: vec![],
            water_year: water_year(peak_date),
        }
    }

    #[test]
    fn test_parse_rdb_basic() {
        let records = parse_rdb(fixture_wildcat_peak_rdb()).unwrap();
        // 1913-03-00 cannot be placed on a date
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].site_code, "03335000");
        assert_eq!(records[0].peak_date, NaiveDate::from_ymd_opt(1955, 2, 28).unwrap());
        assert_eq!(records[0].peak_discharge_cfs, Some(9050.0));
        assert_eq!(records[0].water_year, 1955);
    }

    #[test]
    fn test_parse_with_qualification_codes() {
        let records = parse_rdb(fixture_wildcat_peak_rdb()).unwrap();
        let last = records.last().unwrap();
        assert_eq!(last.peak_qualification_codes, vec!["2", "5"]);
        assert_eq!(last.peak_discharge_cfs, Some(15600.0));
        assert_eq!(last.water_year, 2019);
    }

    #[test]
    fn test_missing_discharge_is_none() {
        let records = parse_rdb(fixture_wildcat_peak_rdb()).unwrap();
        let stage_only = records
            .iter()
            .find(|r| r.peak_date == NaiveDate::from_ymd_opt(2013, 4, 19).unwrap())
            .expect("2013 peak should be present");
        assert_eq!(stage_only.peak_discharge_cfs, None);
    }

    #[test]
    fn test_missing_header_is_error() {
        let err = parse_rdb("# only comments\n").unwrap_err();
        assert!(matches!(err, HydroError::MalformedRecord(_)));
    }

    #[test]
    fn test_missing_format_line_is_error() {
        let err = parse_rdb("agency_cd\tsite_no\tpeak_dt\tpeak_va\n").unwrap_err();
        assert!(matches!(err, HydroError::MalformedRecord(_)));
    }

    #[test]
    fn test_annual_peaks_keeps_largest_per_water_year() {
        let records = vec![
            record((2018, 11, 2), Some(500.0)), // WY 2019
            record((2019, 3, 15), Some(800.0)), // WY 2019
            record((2017, 5, 1), Some(650.0)),  // WY 2017
            record((2020, 1, 1), None),         // WY 2020, no discharge
        ];
        let peaks = annual_peaks(&records);
        assert_eq!(peaks, vec![(2017, 650.0), (2019, 800.0)]);
    }

    #[test]
    fn test_annual_peaks_from_fixture() {
        let records = parse_rdb(fixture_wildcat_peak_rdb()).unwrap();
        let peaks = annual_peaks(&records);
        assert_eq!(peaks, vec![(1955, 9050.0), (1956, 7210.0), (2019, 15600.0)]);
    }
}
