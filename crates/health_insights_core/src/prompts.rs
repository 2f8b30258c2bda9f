//! Prompt templates for per-metric insights and cross-metric recommendations.
//!
//! Only validated numbers and dates from [`MetricStats`] are interpolated;
//! nothing read verbatim from an uploaded file ever reaches a prompt.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::types::{MetricKind, MetricStats};

/// Instruction appended to every per-metric prompt.
pub const INSIGHT_INSTRUCTION: &str = "Respond with one short, actionable insight of at most two sentences. \
Do not restate every number, do not repeat advice already implied by the guidance, and do not give a medical diagnosis.";

/// Maximum characters of insight text embedded in the recommendations prompt.
pub const RECOMMENDATION_BUDGET: usize = 4000;

fn guidance(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Sleep => {
            "Adults generally need 7 to 9 hours of sleep per night. Regularly sleeping under 6 hours is linked to poorer recovery and focus."
        }
        MetricKind::HeartRate => {
            "A typical adult resting heart rate is 60 to 100 bpm. Lower values within that range usually reflect better cardiovascular fitness."
        }
        MetricKind::Hydration => {
            "Most adults need roughly 2 to 3 liters of water per day, more with exercise or heat."
        }
        MetricKind::Steps => {
            "Around 7,000 to 10,000 steps per day is a common target for general health."
        }
        MetricKind::Unknown => "Consider what a healthy range for this measurement looks like.",
    }
}

fn precision(kind: MetricKind) -> usize {
    match kind {
        MetricKind::Steps => 0,
        _ => 1,
    }
}

fn fmt_value(kind: MetricKind, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.*} {}", precision(kind), v, kind.unit()),
        None => "n/a".to_string(),
    }
}

/// Render the bounded prompt for one metric's statistics.
pub fn metric_prompt(stats: &MetricStats) -> String {
    let kind = stats.kind;
    let trend = match stats.change_percent {
        Some(pct) => format!(
            "{} ({:+.1}% second half vs first half)",
            stats.trend.as_str(),
            pct
        ),
        None => stats.trend.as_str().to_string(),
    };
    format!(
        "You are a health data assistant reviewing a user's {label}.\n\
         Period: {period}\n\
         Observations: {count}\n\
         Average: {mean}\n\
         Lowest: {min}\n\
         Highest: {max}\n\
         Trend: {trend}\n\
         Guidance: {guidance}\n\
         {instruction}",
        label = kind.label(),
        period = stats.window,
        count = stats.count,
        mean = fmt_value(kind, stats.mean),
        min = fmt_value(kind, stats.min),
        max = fmt_value(kind, stats.max),
        trend = trend,
        guidance = guidance(kind),
        instruction = INSIGHT_INSTRUCTION,
    )
}

/// Keep the newest insights whose combined length fits `budget`, dropping
/// the oldest first. A single oversized insight is cut to the budget.
fn within_budget(insights: &[String], budget: usize) -> Vec<String> {
    let mut used = 0usize;
    let mut kept = Vec::new();
    for insight in insights.iter().rev() {
        let len = insight.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        kept.push(insight.clone());
    }
    if kept.is_empty() {
        if let Some(last) = insights.last() {
            kept.push(last.chars().take(budget).collect());
        }
    }
    kept.reverse();
    kept
}

/// Render the single cross-metric recommendations prompt.
pub fn recommendations_prompt(insights: &[String]) -> String {
    let observations = within_budget(insights, RECOMMENDATION_BUDGET)
        .iter()
        .map(|i| format!("- {}", i.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "These observations were derived from a user's recent health data:\n\
         {observations}\n\
         Suggest 3 to 5 specific lifestyle recommendations that address them. \
         Write each recommendation on its own line with no introduction or closing remarks."
    )
}

/// Bullet, numbering or heading marker at the start of a line. The marker
/// must be followed by whitespace, so `7.5 hours` or `-5%` are content.
static LIST_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*\x{2022}]+|\d+[.)]|#+)(?:\s+|$)").ok()
});

/// Split generated recommendation text into items, one per line or
/// numbered entry, without bullets, numbering or emphasis markers.
pub fn split_recommendations(text: &str) -> Vec<String> {
    let marker = LIST_MARKER.as_ref();
    if marker.is_none() {
        warn!("list marker pattern failed to compile; keeping raw recommendation lines");
    }
    text.lines()
        .map(|line| {
            let line = match marker {
                Some(re) => re.replace(line, "").into_owned(),
                None => line.to_string(),
            };
            line.replace("**", "").trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trend;
    use chrono::NaiveDate;

    fn sleep_stats() -> MetricStats {
        MetricStats {
            kind: MetricKind::Sleep,
            count: 10,
            mean: Some(6.66),
            min: Some(5.5),
            max: Some(8.1),
            trend: Trend::Stable,
            change_percent: Some(1.818),
            first_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            last_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            window: "2024-01-01 to 2024-01-10".into(),
        }
    }

    #[test]
    fn metric_prompt_embeds_statistics_and_instruction() {
        let prompt = metric_prompt(&sleep_stats());
        assert!(prompt.contains("sleep duration"));
        assert!(prompt.contains("Period: 2024-01-01 to 2024-01-10"));
        assert!(prompt.contains("Observations: 10"));
        assert!(prompt.contains("Average: 6.7 hours"));
        assert!(prompt.contains("Lowest: 5.5 hours"));
        assert!(prompt.contains("stable (+1.8% second half vs first half)"));
        assert!(prompt.contains("7 to 9 hours"));
        assert!(prompt.ends_with(INSIGHT_INSTRUCTION));
    }

    #[test]
    fn steps_are_rendered_without_decimals() {
        let mut stats = sleep_stats();
        stats.kind = MetricKind::Steps;
        stats.mean = Some(8123.4);
        assert!(metric_prompt(&stats).contains("Average: 8123 steps"));
    }

    #[test]
    fn budget_drops_oldest_insights_first() {
        let insights = vec!["a".repeat(3000), "b".repeat(1500), "c".repeat(2000)];
        let kept = within_budget(&insights, RECOMMENDATION_BUDGET);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].starts_with('b'));
        assert!(kept[1].starts_with('c'));

        let prompt = recommendations_prompt(&insights);
        assert!(!prompt.contains(&"a".repeat(10)));
    }

    #[test]
    fn oversized_single_insight_is_truncated() {
        let kept = within_budget(&["x".repeat(5000)], RECOMMENDATION_BUDGET);
        assert_eq!(kept[0].chars().count(), RECOMMENDATION_BUDGET);
    }

    #[test]
    fn list_marker_pattern_compiles() {
        assert!(LIST_MARKER.is_some());
    }

    #[test]
    fn leading_numbers_in_content_are_kept() {
        let text = "7.5 hours of sleep each night is a good target.\n1. Walk daily\n-5% screen time each week\n10) Stretch";
        assert_eq!(
            split_recommendations(text),
            vec![
                "7.5 hours of sleep each night is a good target.",
                "Walk daily",
                "-5% screen time each week",
                "Stretch",
            ]
        );
    }

    #[test]
    fn bare_markers_become_empty_and_are_dropped() {
        assert_eq!(split_recommendations("1.\n-\n## Sleep"), vec!["Sleep"]);
    }

    #[test]
    fn splits_numbered_and_bulleted_lines() {
        let text = "1. Go to bed at the same time.\n\n2) **Drink** a glass of water at breakfast.\n- Take a short walk after lunch.\n* Limit screens before bed";
        assert_eq!(
            split_recommendations(text),
            vec![
                "Go to bed at the same time.",
                "Drink a glass of water at breakfast.",
                "Take a short walk after lunch.",
                "Limit screens before bed",
            ]
        );
    }
}
