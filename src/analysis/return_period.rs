/// Empirical return periods of annual peak flows.
///
/// Peaks are ranked largest first and given the Weibull plotting position
/// `p = rank / (N + 1)`, the estimated probability that a peak of at least
/// that magnitude occurs in any given year. Equal magnitudes keep their
/// input order.

use std::cmp::Ordering;

use crate::ingest::metrics::metric_series;
use crate::logging::{self, Stage};
use crate::model::{MetricRow, ReturnPeriodPoint};

/// Weibull plotting position for `rank` (1-based) among `n` values.
pub fn weibull_plotting_position(rank: usize, n: usize) -> f64 {
    rank as f64 / (n as f64 + 1.0)
}

/// Ranks `peaks` and assigns each an exceedance probability.
///
/// The result is ordered by descending magnitude. NaN and infinite values
/// are dropped before ranking. An empty input gives an empty curve.
pub fn exceedance_curve(peaks: &[f64]) -> Vec<ReturnPeriodPoint> {
    let mut sorted: Vec<f64> = peaks.iter().copied().filter(|v| v.is_finite()).collect();
    let dropped = peaks.len() - sorted.len();
    if dropped > 0 {
        logging::warn(
            Stage::ReturnPeriod,
            None,
            &format!("Dropped {} non-finite peak values before ranking", dropped),
        );
    }

    // sort_by is stable: ties keep input order
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, magnitude)| ReturnPeriodPoint {
            rank: idx + 1,
            exceedance_probability: weibull_plotting_position(idx + 1, n),
            magnitude,
        })
        .collect()
}

/// Annual peaks of `metric` taken from one station's annual metric rows,
/// in row order. Rows without a value are skipped.
pub fn peaks_from_metrics(rows: &[MetricRow], metric: &str) -> Vec<f64> {
    metric_series(rows, metric)
        .into_iter()
        .filter_map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::METRIC_PEAK_FLOW;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn test_three_peaks_example() {
        let curve = exceedance_curve(&[100.0, 300.0, 200.0]);

        let magnitudes: Vec<f64> = curve.iter().map(|p| p.magnitude).collect();
        let probs: Vec<f64> = curve.iter().map(|p| p.exceedance_probability).collect();
        let ranks: Vec<usize> = curve.iter().map(|p| p.rank).collect();

        assert_eq!(magnitudes, vec![300.0, 200.0, 100.0]);
        assert_eq!(probs, vec![0.25, 0.5, 0.75]);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_probabilities_strictly_increase_within_open_unit_interval() {
        let peaks: Vec<f64> = (0..67).map(|i| ((i * 37) % 101) as f64 * 150.0).collect();
        let curve = exceedance_curve(&peaks);
        let n = peaks.len();

        assert_eq!(curve.len(), n);
        assert!(curve.windows(2).all(|w| w[0].exceedance_probability < w[1].exceedance_probability));
        assert!(curve.windows(2).all(|w| w[0].magnitude >= w[1].magnitude));
        assert!(curve.iter().all(|p| p.exceedance_probability > 0.0 && p.exceedance_probability < 1.0));

        let last = curve.last().unwrap();
        assert_eq!(last.exceedance_probability, n as f64 / (n as f64 + 1.0));
    }

    #[test]
    fn test_empty_peaks_give_empty_curve() {
        assert!(exceedance_curve(&[]).is_empty());
    }

    #[test]
    fn test_single_peak_has_probability_one_half() {
        let curve = exceedance_curve(&[4200.0]);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].exceedance_probability, 0.5);
        assert_eq!(curve[0].return_period_years(), 2.0);
    }

    #[test]
    fn test_ties_keep_distinct_ranks() {
        let curve = exceedance_curve(&[500.0, 800.0, 500.0]);
        assert_eq!(curve[1].magnitude, 500.0);
        assert_eq!(curve[2].magnitude, 500.0);
        assert_eq!(curve[1].rank, 2);
        assert_eq!(curve[2].rank, 3);
        assert!(curve[1].exceedance_probability < curve[2].exceedance_probability);
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let curve = exceedance_curve(&[f64::NAN, 10.0, f64::INFINITY, 20.0]);
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].magnitude, 20.0);
        assert!((curve[1].exceedance_probability - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_peaks_from_metrics_skips_absent() {
        let row = |q: Option<f64>| {
            let mut metrics = BTreeMap::new();
            metrics.insert(METRIC_PEAK_FLOW.to_string(), q);
            MetricRow {
                station: "Tippe".to_string(),
                date: NaiveDate::from_ymd_opt(2016, 9, 30).unwrap(),
                metrics,
            }
        };
        let rows = vec![row(Some(5200.0)), row(None), row(Some(4800.0))];
        assert_eq!(peaks_from_metrics(&rows, METRIC_PEAK_FLOW), vec![5200.0, 4800.0]);
    }
}
