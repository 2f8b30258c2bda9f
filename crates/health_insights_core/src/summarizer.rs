//! Descriptive statistics over a recent window of a metric series.

use chrono::{Duration, NaiveDate};

use crate::types::{MetricKind, MetricSeries, MetricStats, NO_PERIOD, Trend};
use crate::utils::mean;

/// Relative half-over-half change at or below which a trend is stable.
pub const STABLE_THRESHOLD: f64 = 0.05;

/// Summarize `series` over the most recent `window_days` calendar days
/// (ending at the last observation), or over all data when `None`.
pub fn summarize(series: &MetricSeries, window_days: Option<u32>) -> MetricStats {
    // A window reaching past the earliest representable date covers all data.
    let cutoff = match (window_days, series.last_date()) {
        (Some(days), Some(last)) => {
            last.checked_sub_signed(Duration::days(i64::from(days.max(1)) - 1))
        }
        _ => None,
    };
    let window: Vec<_> = series
        .observations
        .iter()
        .filter(|o| cutoff.is_none_or(|c| o.date >= c))
        .collect();
    let values: Vec<f64> = window.iter().map(|o| o.value).collect();

    let first_date = window.first().map(|o| o.date);
    let last_date = window.last().map(|o| o.date);
    let (trend, change_percent) = trend_of(series.kind, &values);

    MetricStats {
        kind: series.kind,
        count: values.len(),
        mean: mean(&values),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
        trend,
        change_percent,
        first_date,
        last_date,
        window: describe_period(first_date, last_date),
    }
}

/// Split chronologically in half and compare the halves' means.
fn trend_of(kind: MetricKind, values: &[f64]) -> (Trend, Option<f64>) {
    match values.len() {
        0 => return (Trend::InsufficientData, None),
        1 => return (Trend::Stable, None),
        _ => {}
    }
    let mid = values.len() / 2;
    let (Some(first), Some(second)) = (mean(&values[..mid]), mean(&values[mid..])) else {
        return (Trend::InsufficientData, None);
    };

    if first.abs() < f64::EPSILON {
        if second.abs() < f64::EPSILON {
            return (Trend::Stable, Some(0.0));
        }
        return (direction(kind, second > 0.0), None);
    }

    let change = (second - first) / first.abs();
    let trend = if change.abs() <= STABLE_THRESHOLD {
        Trend::Stable
    } else {
        direction(kind, change > 0.0)
    };
    (trend, Some(change * 100.0))
}

fn direction(kind: MetricKind, increased: bool) -> Trend {
    if increased == kind.higher_is_better() {
        Trend::Improving
    } else {
        Trend::Declining
    }
}

/// Format a date range as `first to last`, or `N/A` when unknown.
pub fn describe_period(first: Option<NaiveDate>, last: Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => NO_PERIOD.to_string(),
    }
}

/// Union of the windows of several summaries: earliest first date to latest
/// last date.
pub fn union_period<'a, I>(stats: I) -> String
where
    I: IntoIterator<Item = &'a MetricStats>,
{
    let (first, last) = stats
        .into_iter()
        .fold((None, None), |(first, last): (Option<NaiveDate>, Option<NaiveDate>), s| {
            (
                min_date(first, s.first_date),
                max_date(last, s.last_date),
            )
        });
    describe_period(first, last)
}

fn min_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(kind: MetricKind, values: &[f64]) -> MetricSeries {
        MetricSeries::from_values(
            kind,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Observation {
                    date: day(i as u32 + 1),
                    value: *v,
                })
                .collect(),
        )
    }

    #[test]
    fn ten_day_sleep_scenario_is_stable() {
        let s = series(
            MetricKind::Sleep,
            &[6.5, 7.2, 5.8, 6.0, 7.5, 8.1, 6.2, 7.0, 5.5, 6.8],
        );
        let stats = summarize(&s, None);
        assert_eq!(stats.count, 10);
        assert!((stats.mean.unwrap() - 6.66).abs() < 1e-9);
        assert_eq!(stats.min, Some(5.5));
        assert_eq!(stats.max, Some(8.1));
        // halves: 6.60 vs 6.72, +1.8%
        assert!((stats.change_percent.unwrap() - 1.818).abs() < 0.01);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(stats.window, "2024-01-01 to 2024-01-10");
    }

    #[test]
    fn empty_series_has_no_statistics() {
        let stats = summarize(&MetricSeries::new(MetricKind::Steps), Some(7));
        assert_eq!(stats.count, 0);
        assert_eq!(stats.trend, Trend::InsufficientData);
        assert!(stats.mean.is_none() && stats.min.is_none() && stats.max.is_none());
        assert_eq!(stats.window, "N/A");
    }

    #[test]
    fn single_observation_is_stable() {
        let stats = summarize(&series(MetricKind::Hydration, &[2.0]), None);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(stats.mean, Some(2.0));
    }

    #[test]
    fn heart_rate_decrease_is_improving() {
        let stats = summarize(&series(MetricKind::HeartRate, &[80.0, 82.0, 70.0, 68.0]), None);
        assert_eq!(stats.trend, Trend::Improving);

        let stats = summarize(&series(MetricKind::Steps, &[8000.0, 8200.0, 6000.0, 5800.0]), None);
        assert_eq!(stats.trend, Trend::Declining);
    }

    #[test]
    fn window_bounds_to_most_recent_days() {
        let s = series(MetricKind::Sleep, &[5.0, 5.0, 5.0, 8.0, 8.0]);
        let stats = summarize(&s, Some(2));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, Some(8.0));
        assert_eq!(stats.window, "2024-01-04 to 2024-01-05");
    }

    #[test]
    fn oversized_window_reports_observed_range() {
        let s = series(MetricKind::Sleep, &[7.0, 7.1, 7.2]);
        let stats = summarize(&s, Some(90));
        assert_eq!(stats.count, 3);
        assert_eq!(stats.window, "2024-01-01 to 2024-01-03");
    }

    #[test]
    fn huge_window_covers_all_data() {
        let stats = summarize(&series(MetricKind::Steps, &[4000.0]), Some(u32::MAX));
        assert_eq!(stats.count, 1);
        assert_eq!(stats.window, "2024-01-01 to 2024-01-01");

        let stats = summarize(&series(MetricKind::Sleep, &[7.0, 7.1, 7.2]), Some(u32::MAX));
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, summarize(&series(MetricKind::Sleep, &[7.0, 7.1, 7.2]), None).mean);
    }

    #[test]
    fn union_period_spans_all_windows() {
        let a = summarize(&series(MetricKind::Sleep, &[7.0, 7.0]), None);
        let mut b = summarize(&series(MetricKind::Steps, &[1.0, 2.0, 3.0, 4.0]), None);
        b.first_date = Some(day(2));
        assert_eq!(union_period([&a, &b]), "2024-01-01 to 2024-01-04");
        assert_eq!(union_period(std::iter::empty()), "N/A");
    }
}
