/// Missing-aware descriptive statistics.
///
/// `mean_ignoring_missing` is the one place where "absent values are left
/// out of an average" is decided; the climatology aggregator uses it for
/// every metric. `summarize` gives the count / mean / std / quartile
/// overview of a daily series that gets printed before and after clipping.

use serde::Serialize;

use crate::model::ObservationSeries;

/// Arithmetic mean of the present, finite values. `None` if there are none.
pub fn mean_ignoring_missing<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Linear-interpolated quantile of an ascending slice, `q` in [0, 1].
fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Describe-style summary of a daily discharge series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Days in the series, present or not.
    pub days: usize,
    /// Days with a discharge value.
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1). Needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarize(series: &ObservationSeries) -> SeriesSummary {
    let mut values: Vec<f64> = series.discharges().collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    let mean = mean_ignoring_missing(values.iter().copied().map(Some));
    let std = match (mean, count) {
        (Some(m), n) if n > 1 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    SeriesSummary {
        days: series.len(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    }
}
