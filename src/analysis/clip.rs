/// Date-window clipping of a cleaned daily series.
///
/// Keeps observations with `start <= date <= end` (both ends inclusive) and
/// recounts missing days inside the window only. Clipping never mutates the
/// input; it returns a new series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ingest::daily_values::DATE_FORMAT;
use crate::logging::{self, Stage};
use crate::model::{HydroError, ObservationSeries};

/// Inclusive date window with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// # Errors
    /// `HydroError::InvalidRange` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, HydroError> {
        if start > end {
            return Err(HydroError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a window from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    /// - `HydroError::MalformedRecord` - a bound does not parse.
    /// - `HydroError::InvalidRange` - start after end.
    pub fn parse(start: &str, end: &str) -> Result<Self, HydroError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map_err(|e| HydroError::MalformedRecord(format!("Invalid date bound '{}': {}", s, e)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A clipped series with its recomputed missing-day count.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedSeries {
    pub series: ObservationSeries,
    pub missing_count: usize,
}

/// Restricts `series` to `window`.
pub fn clip_to_window(series: &ObservationSeries, window: &DateWindow) -> ClippedSeries {
    let observations: Vec<_> = series
        .observations
        .iter()
        .filter(|o| window.contains(o.date))
        .cloned()
        .collect();

    let clipped = ObservationSeries {
        site_code: series.site_code.clone(),
        observations,
    };
    let missing_count = clipped.missing_count();

    logging::debug(
        Stage::Clip,
        Some(&clipped.site_code),
        &format!(
            "Clipped {} -> {} observations to {}..{} ({} missing)",
            series.len(),
            clipped.len(),
            window.start,
            window.end,
            missing_count
        ),
    );

    ClippedSeries {
        series: clipped,
        missing_count,
    }
}

/// Restricts `series` to the inclusive range `[start, end]`.
///
/// # Errors
/// `HydroError::InvalidRange` if `start` is after `end`.
pub fn clip(
    series: &ObservationSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ClippedSeries, HydroError> {
    let window = DateWindow::new(start, end)?;
    Ok(clip_to_window(series, &window))
}
