/// Average annual monthly values from a water-year-ordered metric table.
///
/// The monthly metric table lists one row per month, grouped in water-year
/// blocks that start in October:
///
/// ```text
/// offset:  0   1   2   3  4  5  6  7  8  9  10  11
/// month:  Oct Nov Dec Jan Feb Mar Apr May Jun Jul Aug Sep
/// ```
///
/// Rows at offsets `i, i + 12, i + 24, …` belong to the same calendar month.
/// Their metrics are averaged (absent values left out) and the result is
/// re-keyed by calendar month so that entry 0 is January.

use std::collections::BTreeSet;

use chrono::Datelike;

use crate::analysis::stats::mean_ignoring_missing;
use crate::logging::{self, Stage};
use crate::model::{HydroError, MetricRow, MonthlyClimatology, MonthlyMean};

/// Rows per water-year block.
pub const PERIODS_PER_YEAR: usize = 12;

/// Calendar month for each offset within a water-year block.
pub const WATER_YEAR_MONTHS: [u32; PERIODS_PER_YEAR] = [10, 11, 12, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Calendar month of the row at `offset` in a water-year block.
pub fn calendar_month_for_offset(offset: usize) -> u32 {
    WATER_YEAR_MONTHS[offset % PERIODS_PER_YEAR]
}

/// Position of calendar `month` within a water-year block.
pub fn offset_for_calendar_month(month: u32) -> Option<usize> {
    WATER_YEAR_MONTHS.iter().position(|&m| m == month)
}

/// Computes the cross-year mean of every metric for each calendar month.
///
/// `rows` must be in water-year block order (see module docs). At most
/// `year_span` blocks are used; a shorter history is averaged over whatever
/// rows exist. A month with no usable value for a metric gets `None` for
/// that metric.
///
/// # Errors
/// `HydroError::InvalidPeriodLength` if `periods_per_year` is not 12.
pub fn monthly_averages(
    rows: &[MetricRow],
    periods_per_year: usize,
    year_span: usize,
) -> Result<MonthlyClimatology, HydroError> {
    if periods_per_year != PERIODS_PER_YEAR {
        return Err(HydroError::InvalidPeriodLength(periods_per_year));
    }

    let limit = rows.len().min(year_span.saturating_mul(PERIODS_PER_YEAR));
    let rows = &rows[..limit];
    let station = rows.first().map(|r| r.station.as_str());

    let metric_names: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.metrics.keys().map(String::as_str))
        .collect();

    let misaligned_rows = rows
        .iter()
        .enumerate()
        .filter(|(idx, row)| row.date.month() != calendar_month_for_offset(*idx))
        .count();
    if misaligned_rows > 0 {
        logging::warn(
            Stage::Climatology,
            station,
            &format!(
                "{} of {} monthly rows do not match their water-year position",
                misaligned_rows,
                rows.len()
            ),
        );
    }

    let months: [MonthlyMean; PERIODS_PER_YEAR] = std::array::from_fn(|idx| {
        let month = idx as u32 + 1;
        let offset = offset_for_calendar_month(month).unwrap_or(idx);
        let group: Vec<&MetricRow> = rows.iter().skip(offset).step_by(PERIODS_PER_YEAR).collect();

        let metrics = metric_names
            .iter()
            .map(|name| {
                let mean = mean_ignoring_missing(group.iter().map(|r| r.get(name)));
                (name.to_string(), mean)
            })
            .collect();

        MonthlyMean {
            month,
            years: group.len(),
            metrics,
        }
    });

    logging::debug(
        Stage::Climatology,
        station,
        &format!("Averaged {} monthly rows into 12 calendar months", rows.len()),
    );

    Ok(MonthlyClimatology {
        months,
        misaligned_rows,
    })
}
