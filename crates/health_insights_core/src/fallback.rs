//! Deterministic threshold rules producing the same result shape as the
//! generated path.

use crate::summarizer::union_period;
use crate::types::{AnalysisType, Insight, InsightResult, MetricKind, MetricStats, Severity};

pub const SLEEP_MIN_HOURS: f64 = 6.0;
pub const SLEEP_TARGET_HOURS: f64 = 7.0;
pub const RESTING_HR_LOW: f64 = 50.0;
pub const RESTING_HR_HIGH: f64 = 100.0;
pub const HYDRATION_MIN_LITERS: f64 = 1.5;
pub const STEPS_LOW: f64 = 5000.0;
pub const STEPS_TARGET: f64 = 10000.0;

const MAINTENANCE: &str =
    "Keep up your current routine and continue tracking your health metrics regularly.";

struct Rule {
    message: String,
    severity: Severity,
    recommendation: Option<&'static str>,
}

fn evaluate(kind: MetricKind, mean: f64) -> Option<Rule> {
    let rule = match kind {
        MetricKind::Sleep if mean < SLEEP_MIN_HOURS => Rule {
            message: format!(
                "Average sleep of {mean:.1} hours is below the recommended 7-9 hours."
            ),
            severity: Severity::Warning,
            recommendation: Some(
                "Aim for 7-9 hours of sleep by keeping a consistent bedtime and limiting screens in the evening.",
            ),
        },
        MetricKind::Sleep if mean < SLEEP_TARGET_HOURS => Rule {
            message: format!(
                "Average sleep of {mean:.1} hours is slightly under the recommended 7-9 hours."
            ),
            severity: Severity::Info,
            recommendation: None,
        },
        MetricKind::Sleep => Rule {
            message: format!("Average sleep of {mean:.1} hours is within a healthy range."),
            severity: Severity::Good,
            recommendation: None,
        },
        MetricKind::HeartRate if !(RESTING_HR_LOW..=RESTING_HR_HIGH).contains(&mean) => Rule {
            message: format!(
                "Average resting heart rate of {mean:.0} bpm is outside the typical 50-100 bpm range."
            ),
            severity: Severity::Caution,
            recommendation: Some(
                "Consider discussing your resting heart rate with a healthcare professional.",
            ),
        },
        MetricKind::HeartRate => Rule {
            message: format!("Average resting heart rate of {mean:.0} bpm is within the normal range."),
            severity: Severity::Good,
            recommendation: None,
        },
        MetricKind::Hydration if mean < HYDRATION_MIN_LITERS => Rule {
            message: format!(
                "Average water intake of {mean:.1} liters per day is below the recommended level."
            ),
            severity: Severity::Warning,
            recommendation: Some(
                "Drink water regularly through the day, aiming for at least 2 liters.",
            ),
        },
        MetricKind::Hydration => Rule {
            message: format!("Average water intake of {mean:.1} liters per day looks adequate."),
            severity: Severity::Good,
            recommendation: None,
        },
        MetricKind::Steps if mean < STEPS_LOW => Rule {
            message: format!("Average of {mean:.0} steps per day indicates low daily activity."),
            severity: Severity::Info,
            recommendation: Some("Add short walks to your day to reach at least 7,000 steps."),
        },
        MetricKind::Steps if mean >= STEPS_TARGET => Rule {
            message: format!("Average of {mean:.0} steps per day meets the 10,000 step target."),
            severity: Severity::Good,
            recommendation: None,
        },
        MetricKind::Steps => Rule {
            message: format!("Average of {mean:.0} steps per day is a moderate activity level."),
            severity: Severity::Info,
            recommendation: None,
        },
        MetricKind::Unknown => return None,
    };
    Some(rule)
}

/// Apply the threshold rules to per-metric statistics, in the order given.
pub fn analyze(stats: &[MetricStats]) -> InsightResult {
    let mut result = InsightResult::empty(AnalysisType::RuleBased);
    let with_data: Vec<&MetricStats> = stats.iter().filter(|s| s.count > 0).collect();

    for s in &with_data {
        let Some(mean) = s.mean else { continue };
        let Some(rule) = evaluate(s.kind, mean) else {
            continue;
        };
        result.insights.push(Insight::Rated {
            message: rule.message,
            severity: rule.severity,
        });
        if let Some(rec) = rule.recommendation {
            result.recommendations.push(rec.to_string());
        }
    }

    if !with_data.is_empty() {
        if result.recommendations.is_empty() {
            result.recommendations.push(MAINTENANCE.to_string());
        }
        result.context_period = union_period(with_data.iter().copied());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::summarize;
    use crate::types::{MetricSeries, Observation};
    use chrono::NaiveDate;

    fn stats(kind: MetricKind, values: &[f64]) -> MetricStats {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                date: NaiveDate::from_ymd_opt(2024, 3, i as u32 + 1).unwrap(),
                value: *v,
            })
            .collect();
        summarize(&MetricSeries::from_values(kind, observations), None)
    }

    fn severities(result: &InsightResult) -> Vec<Severity> {
        result.insights.iter().filter_map(Insight::severity).collect()
    }

    #[test]
    fn heart_rate_in_range_is_not_caution() {
        let result = analyze(&[stats(MetricKind::HeartRate, &[60.0, 72.0, 88.0, 100.0, 65.0])]);
        assert_eq!(result.analysis_type, AnalysisType::RuleBased);
        assert!(!severities(&result).contains(&Severity::Caution));
        assert_eq!(severities(&result), vec![Severity::Good]);
    }

    #[test]
    fn heart_rate_out_of_range_is_caution() {
        let result = analyze(&[stats(MetricKind::HeartRate, &[104.0, 110.0])]);
        assert_eq!(severities(&result), vec![Severity::Caution]);
        assert_eq!(result.recommendations.len(), 1);

        let result = analyze(&[stats(MetricKind::HeartRate, &[45.0, 47.0])]);
        assert_eq!(severities(&result), vec![Severity::Caution]);
    }

    #[test]
    fn short_sleep_and_low_hydration_warn() {
        let result = analyze(&[
            stats(MetricKind::Sleep, &[5.0, 5.5, 5.8]),
            stats(MetricKind::Hydration, &[1.0, 1.2]),
        ]);
        assert_eq!(severities(&result), vec![Severity::Warning, Severity::Warning]);
        assert_eq!(result.recommendations.len(), 2);
        assert!(result.insights[0].message().contains("5.4 hours"));
        assert_eq!(result.context_period, "2024-03-01 to 2024-03-03");
    }

    #[test]
    fn steps_bands() {
        let low = analyze(&[stats(MetricKind::Steps, &[3000.0, 4000.0])]);
        assert_eq!(severities(&low), vec![Severity::Info]);
        assert_eq!(low.recommendations.len(), 1);

        let high = analyze(&[stats(MetricKind::Steps, &[11000.0, 12000.0])]);
        assert_eq!(severities(&high), vec![Severity::Good]);
    }

    #[test]
    fn healthy_data_gets_maintenance_recommendation() {
        let result = analyze(&[stats(MetricKind::Sleep, &[7.5, 8.0])]);
        assert_eq!(result.recommendations, vec![MAINTENANCE.to_string()]);
    }

    #[test]
    fn no_data_yields_empty_result() {
        let result = analyze(&[stats(MetricKind::Sleep, &[])]);
        assert_eq!(result, InsightResult::empty(AnalysisType::RuleBased));
    }
}
