/// Per-station pipeline and the parallel runner.
///
/// One station's pipeline is:
///
/// 1. tokenize + load the daily-value text (clean, sort, dedup)
/// 2. clip to the analysis window
/// 3. summarize the series before and after clipping
/// 4. average the station's monthly metric rows into a calendar climatology
/// 5. rank the annual peaks into an exceedance curve (peak file if given,
///    otherwise the annual metric table)
///
/// Each pipeline owns its inputs and shares nothing with other stations, so
/// `run_stations` can hand them to a thread pool without any locking.

use serde::Serialize;
use std::sync::{mpsc, Arc};
use threadpool::ThreadPool;

use crate::analysis::climatology::{monthly_averages, PERIODS_PER_YEAR};
use crate::analysis::clip::{clip_to_window, DateWindow};
use crate::analysis::return_period::{exceedance_curve, peaks_from_metrics};
use crate::analysis::stats::{summarize, SeriesSummary};
use crate::config::AppConfig;
use crate::ingest::daily_values::{load, parse_daily_values};
use crate::ingest::peak_flow::{annual_peaks, parse_rdb};
use crate::logging::{self, Stage};
use crate::model::{HydroError, MetricRow, MonthlyClimatology, ObservationSeries, ReturnPeriodPoint};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Settings shared by every station in a run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub window: DateWindow,
    pub sentinels: Vec<String>,
    pub year_span: usize,
    pub peak_metric: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, HydroError> {
        Ok(Self {
            window: config.window()?,
            sentinels: config.ingest.no_data_sentinels.clone(),
            year_span: config.climatology.year_span,
            peak_metric: config.metrics.peak_metric.clone(),
        })
    }
}

/// Everything one station's pipeline needs, already read into memory.
#[derive(Debug, Clone)]
pub struct StationJob {
    pub label: String,
    pub name: String,
    /// Expected USGS site code; the daily file's own code wins if they differ.
    pub site_code: String,
    /// Daily-value export text.
    pub daily_text: String,
    /// Peak streamflow export text, if the station has one.
    pub peak_text: Option<String>,
    /// This station's rows of the annual metric table.
    pub annual_rows: Vec<MetricRow>,
    /// This station's rows of the monthly metric table, water-year ordered.
    pub monthly_rows: Vec<MetricRow>,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakSource {
    PeakFile,
    MetricTable,
}

/// Cleaning diagnostics from the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadDiagnostics {
    pub missing_count: usize,
    pub malformed_rows: usize,
    pub gross_errors_removed: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub label: String,
    pub name: String,
    pub site_code: String,
    pub load: LoadDiagnostics,
    pub raw_summary: SeriesSummary,
    pub window: DateWindow,
    pub clipped: ObservationSeries,
    pub clipped_missing: usize,
    /// Days in the window flagged `A:e` or `P:e`.
    pub clipped_estimated: usize,
    pub clipped_summary: SeriesSummary,
    pub climatology: MonthlyClimatology,
    pub peak_source: PeakSource,
    pub return_periods: Vec<ReturnPeriodPoint>,
}

// ---------------------------------------------------------------------------
// Single station
// ---------------------------------------------------------------------------

/// Runs the full pipeline for one station.
///
/// # Errors
/// Only structural problems: an unreadable peak file header
/// (`HydroError::MalformedRecord`). Bad rows are skipped inside each stage.
pub fn run_station(job: &StationJob, settings: &PipelineSettings) -> Result<StationReport, HydroError> {
    let label = job.label.as_str();
    let sentinels: Vec<&str> = settings.sentinels.iter().map(String::as_str).collect();

    let loaded = load(&parse_daily_values(&job.daily_text), &sentinels);
    logging::info(
        Stage::Ingest,
        Some(label),
        &format!(
            "Loaded {} daily values ({} missing)",
            loaded.series.len(),
            loaded.missing_count
        ),
    );
    if !loaded.series.site_code.is_empty() && loaded.series.site_code != job.site_code {
        logging::warn(
            Stage::Ingest,
            Some(label),
            &format!(
                "Daily file is for site {}, expected {}",
                loaded.series.site_code, job.site_code
            ),
        );
    }
    let site_code = if loaded.series.site_code.is_empty() {
        job.site_code.clone()
    } else {
        loaded.series.site_code.clone()
    };
    let raw_summary = summarize(&loaded.series);

    let clipped = clip_to_window(&loaded.series, &settings.window);
    logging::info(
        Stage::Clip,
        Some(label),
        &format!(
            "{} days in {}..{} ({} missing)",
            clipped.series.len(),
            settings.window.start,
            settings.window.end,
            clipped.missing_count
        ),
    );
    let clipped_summary = summarize(&clipped.series);
    let clipped_estimated = clipped
        .series
        .observations
        .iter()
        .filter(|o| o.quality_flag.is_estimated())
        .count();

    let climatology = monthly_averages(&job.monthly_rows, PERIODS_PER_YEAR, settings.year_span)?;

    let (peak_source, peaks) = match &job.peak_text {
        Some(text) => {
            let records = parse_rdb(text)?;
            let peaks: Vec<f64> = annual_peaks(&records).into_iter().map(|(_, q)| q).collect();
            (PeakSource::PeakFile, peaks)
        }
        None => (
            PeakSource::MetricTable,
            peaks_from_metrics(&job.annual_rows, &settings.peak_metric),
        ),
    };
    let return_periods = exceedance_curve(&peaks);
    logging::info(
        Stage::ReturnPeriod,
        Some(label),
        &format!("Ranked {} annual peaks ({:?})", return_periods.len(), peak_source),
    );

    Ok(StationReport {
        label: job.label.clone(),
        name: job.name.clone(),
        site_code,
        load: LoadDiagnostics {
            missing_count: loaded.missing_count,
            malformed_rows: loaded.malformed_rows,
            gross_errors_removed: loaded.gross_errors_removed,
            duplicates_dropped: loaded.duplicates_dropped,
        },
        raw_summary,
        window: settings.window,
        clipped: clipped.series,
        clipped_missing: clipped.missing_count,
        clipped_estimated,
        clipped_summary,
        climatology,
        peak_source,
        return_periods,
    })
}

// ---------------------------------------------------------------------------
// Many stations
// ---------------------------------------------------------------------------

/// Runs every job on a pool of `workers` threads.
///
/// Results come back in job order as `(label, result)`. A station whose
/// worker panicked is logged and left out.
pub fn run_stations(
    jobs: Vec<StationJob>,
    settings: &PipelineSettings,
    workers: usize,
) -> Vec<(String, Result<StationReport, HydroError>)> {
    let total = jobs.len();
    let labels: Vec<String> = jobs.iter().map(|j| j.label.clone()).collect();
    let pool = ThreadPool::new(workers.max(1));
    let settings = Arc::new(settings.clone());
    let (tx, rx) = mpsc::channel();

    for (idx, job) in jobs.into_iter().enumerate() {
        let tx = tx.clone();
        let settings = Arc::clone(&settings);
        pool.execute(move || {
            let result = run_station(&job, &settings);
            // receiver outlives the pool; a send error means the run was abandoned
            let _ = tx.send((idx, result));
        });
    }
    drop(tx);

    let mut results: Vec<(usize, Result<StationReport, HydroError>)> = rx.iter().collect();
    results.sort_by_key(|(idx, _)| *idx);

    if results.len() < total {
        for (idx, label) in labels.iter().enumerate() {
            if !results.iter().any(|(i, _)| *i == idx) {
                logging::error(Stage::Pipeline, Some(label), "Station worker panicked");
            }
        }
    }

    let successful = results.iter().filter(|(_, r)| r.is_ok()).count();
    logging::log_run_summary(total, successful);

    results
        .into_iter()
        .map(|(idx, result)| (labels[idx].clone(), result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::{
        fixture_annual_metrics_csv, fixture_wildcat_daily_rdb, fixture_wildcat_peak_rdb,
    };
    use crate::ingest::metrics::{parse_metrics_csv, rows_for_station};
    use crate::model::DEFAULT_NO_DATA_SENTINELS;

    fn settings(start: &str, end: &str) -> PipelineSettings {
        PipelineSettings {
            window: DateWindow::parse(start, end).unwrap(),
            sentinels: DEFAULT_NO_DATA_SENTINELS.iter().map(|s| s.to_string()).collect(),
            year_span: 50,
            peak_metric: "Peak Flow".to_string(),
        }
    }

    fn wildcat_job(peak_text: Option<String>) -> StationJob {
        let annual = parse_metrics_csv(fixture_annual_metrics_csv()).unwrap();
        StationJob {
            label: "Wildcat".to_string(),
            name: "Wildcat Creek".to_string(),
            site_code: "03335000".to_string(),
            daily_text: fixture_wildcat_daily_rdb().to_string(),
            peak_text,
            annual_rows: rows_for_station(&annual, "Wildcat"),
            monthly_rows: vec![],
        }
    }

    #[test]
    fn test_run_station_from_metric_table() {
        let report = run_station(&wildcat_job(None), &settings("2014-10-01", "2014-10-05")).unwrap();

        assert_eq!(report.site_code, "03335000");
        assert_eq!(report.load.missing_count, 2);
        assert_eq!(report.load.gross_errors_removed, 1);
        assert_eq!(report.raw_summary.days, 7);
        assert_eq!(report.clipped.len(), 4);
        assert_eq!(report.clipped_missing, 2);
        assert_eq!(report.clipped_estimated, 1);
        assert_eq!(report.peak_source, PeakSource::MetricTable);

        let magnitudes: Vec<f64> = report.return_periods.iter().map(|p| p.magnitude).collect();
        assert_eq!(magnitudes, vec![2100.0, 1800.0, 1500.0]);
        assert_eq!(report.climatology.months.len(), 12);
    }

    #[test]
    fn test_run_station_prefers_peak_file() {
        let job = wildcat_job(Some(fixture_wildcat_peak_rdb().to_string()));
        let report = run_station(&job, &settings("2014-10-01", "2019-09-30")).unwrap();

        assert_eq!(report.peak_source, PeakSource::PeakFile);
        assert_eq!(report.return_periods.len(), 3);
        assert_eq!(report.return_periods[0].magnitude, 15600.0);
        assert_eq!(report.return_periods[0].exceedance_probability, 0.25);
    }

    #[test]
    fn test_run_station_falls_back_to_configured_site_code() {
        let mut job = wildcat_job(None);
        job.daily_text = "2014-10-01 12.0\n".to_string();
        job.site_code = "03335000".to_string();
        let report = run_station(&job, &settings("2014-10-01", "2014-10-05")).unwrap();
        assert_eq!(report.site_code, "03335000");
    }

    #[test]
    fn test_run_station_bad_peak_file_is_error() {
        let job = wildcat_job(Some("# nothing here\n".to_string()));
        let result = run_station(&job, &settings("2014-10-01", "2019-09-30"));
        assert!(matches!(result, Err(HydroError::MalformedRecord(_))));
    }

    #[test]
    fn test_run_stations_preserves_job_order() {
        let mut jobs = Vec::new();
        for label in ["A", "B", "C", "D", "E"] {
            let mut job = wildcat_job(None);
            job.label = label.to_string();
            jobs.push(job);
        }
        jobs[2].peak_text = Some("garbage".to_string());

        let results = run_stations(jobs, &settings("2014-10-01", "2019-09-30"), 3);
        let labels: Vec<&str> = results.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D", "E"]);
        assert!(results[2].1.is_err());
        assert!(results.iter().enumerate().all(|(i, (_, r))| i == 2 || r.is_ok()));
    }

    #[test]
    fn test_run_stations_empty() {
        assert!(run_stations(vec![], &settings("2014-10-01", "2019-09-30"), 2).is_empty());
    }
}
