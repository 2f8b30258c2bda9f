//! Builds the stored record for an upload: summary averages, trends,
//! anomalies, the flattened time series and the engine's insights.

use chrono::NaiveDate;
use health_insights_core::summarizer::summarize;
use health_insights_core::utils::{mean, round1};
use health_insights_core::{
    HealthDataset, InsightEngine, InsightError, InsightResult, MetricKind, MetricSeries,
    NormalizeOptions, Normalizer, RawTable, Trend,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::csv_input::first_user_id;
use crate::error::ServerResult;

/// Days covered by the `*_avg_7d` summary fields.
pub const SUMMARY_WINDOW_DAYS: u32 = 7;
/// Absolute z-score above which an observation is a statistical outlier.
pub const OUTLIER_Z: f64 = 2.5;

pub const UPLOADS_TOTAL: &str = "health_insights_uploads_total";
pub const ANOMALIES_TOTAL: &str = "health_insights_anomalies_total";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_users: u32,
    pub records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_avg_7d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate_avg_7d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_avg_7d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_avg_7d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    pub metric: MetricKind,
    pub direction: Trend,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub metric: MetricKind,
    pub day: NaiveDate,
    pub value: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub metric: MetricKind,
    pub day: NaiveDate,
    pub value: f64,
}

/// Everything kept for one upload. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub user_id: String,
    pub filename: Option<String>,
    pub summary: UploadSummary,
    pub trends: Vec<TrendEntry>,
    pub anomalies: Vec<Anomaly>,
    pub timeseries: Vec<TimeseriesPoint>,
    pub insights: InsightResult,
}

/// Normalize `table` once and derive the full record from it. A table with
/// no usable observations still produces a record with empty sections.
pub async fn process_upload(
    engine: &InsightEngine,
    table: &RawTable,
    filename: Option<String>,
) -> ServerResult<UploadRecord> {
    let options = NormalizeOptions::default().with_date_format(engine.config().date_format.clone());
    let dataset = match Normalizer::normalize(table, &options) {
        Ok(dataset) => Some(dataset),
        Err(InsightError::EmptyDataset) => None,
        Err(e) => return Err(e.into()),
    };

    let record = match dataset {
        Some(dataset) => UploadRecord {
            user_id: first_user_id(table).unwrap_or_else(|| "unknown".into()),
            filename,
            summary: summarize_upload(&dataset, table.row_count()),
            trends: trends(engine, &dataset),
            anomalies: dataset.iter().flat_map(detect_anomalies).collect(),
            timeseries: timeseries(&dataset),
            insights: engine.analyze(&dataset).await,
        },
        None => {
            debug!("upload has no usable observations");
            UploadRecord {
                user_id: first_user_id(table).unwrap_or_else(|| "unknown".into()),
                filename,
                summary: UploadSummary {
                    total_users: 1,
                    records: table.row_count(),
                    ..UploadSummary::default()
                },
                trends: Vec::new(),
                anomalies: Vec::new(),
                timeseries: Vec::new(),
                insights: InsightResult::empty(engine.default_analysis_type()),
            }
        }
    };
    counter!(UPLOADS_TOTAL).increment(1);
    counter!(ANOMALIES_TOTAL).increment(record.anomalies.len() as u64);
    info!(
        records = record.summary.records,
        anomalies = record.anomalies.len(),
        analysis_type = record.insights.analysis_type.as_str(),
        "processed upload"
    );
    Ok(record)
}

fn summarize_upload(dataset: &HealthDataset, records: usize) -> UploadSummary {
    let avg = |kind| {
        dataset
            .get(kind)
            .and_then(|s| summarize(s, Some(SUMMARY_WINDOW_DAYS)).mean)
            .map(round1)
    };
    UploadSummary {
        total_users: 1,
        records,
        sleep_avg_7d: avg(MetricKind::Sleep),
        heart_rate_avg_7d: avg(MetricKind::HeartRate),
        water_avg_7d: avg(MetricKind::Hydration),
        steps_avg_7d: avg(MetricKind::Steps),
    }
}

fn trends(engine: &InsightEngine, dataset: &HealthDataset) -> Vec<TrendEntry> {
    engine
        .summarize_all(dataset)
        .into_iter()
        .map(|stats| TrendEntry {
            metric: stats.kind,
            direction: stats.trend,
            change_percent: stats.change_percent.map(round1),
        })
        .collect()
}

fn timeseries(dataset: &HealthDataset) -> Vec<TimeseriesPoint> {
    dataset
        .iter()
        .flat_map(|s| {
            s.observations.iter().map(|o| TimeseriesPoint {
                metric: s.kind,
                day: o.date,
                value: o.value,
            })
        })
        .collect()
}

fn physiological_alert(kind: MetricKind, value: f64) -> Option<&'static str> {
    match kind {
        MetricKind::HeartRate if value > 120.0 => Some("Urgent: heart rate above 120 bpm"),
        MetricKind::HeartRate if value < 40.0 => Some("Urgent: heart rate below 40 bpm"),
        MetricKind::Sleep if value < 4.0 => Some("Urgent: less than 4 hours of sleep"),
        _ => None,
    }
}

/// Flag invalid, physiologically alarming and statistically unusual values.
pub fn detect_anomalies(series: &MetricSeries) -> Vec<Anomaly> {
    let values: Vec<f64> = series.observations.iter().map(|o| o.value).collect();
    let Some(avg) = mean(&values) else {
        return Vec::new();
    };
    let std_dev = (values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64).sqrt();

    series
        .observations
        .iter()
        .filter_map(|o| {
            let reason = if o.value < 0.0 {
                "Invalid negative value".to_string()
            } else if let Some(alert) = physiological_alert(series.kind, o.value) {
                alert.to_string()
            } else {
                let z = if std_dev > 0.0 { (o.value - avg) / std_dev } else { 0.0 };
                if z.abs() <= OUTLIER_Z {
                    return None;
                }
                format!("Statistical outlier (z-score {z:.1})")
            };
            Some(Anomaly {
                metric: series.kind,
                day: o.date,
                value: o.value,
                reason,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_insights_core::{AnalysisConfig, AnalysisType, Observation};

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

    fn table(csv: &str) -> RawTable {
        crate::csv_input::read_table_from_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn flags_negative_and_urgent_values() {
        let anomalies = detect_anomalies(&series(MetricKind::HeartRate, &[70.0, -5.0, 130.0, 35.0]));
        let reasons: Vec<_> = anomalies.iter().map(|a| a.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "Invalid negative value",
                "Urgent: heart rate above 120 bpm",
                "Urgent: heart rate below 40 bpm"
            ]
        );
        assert_eq!(anomalies[0].day, day(2));
    }

    #[test]
    fn flags_statistical_outliers() {
        let mut values = vec![7.0; 9];
        values.push(12.0);
        let anomalies = detect_anomalies(&series(MetricKind::Sleep, &values));
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, 12.0);
        assert!(anomalies[0].reason.starts_with("Statistical outlier"));
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        assert!(detect_anomalies(&series(MetricKind::Steps, &[5000.0; 5])).is_empty());
    }

    #[tokio::test]
    async fn builds_full_record() {
        let engine = InsightEngine::rule_based(AnalysisConfig::default());
        let t = table(
            "user_id,date,sleep_hours,heart_rate,water_liters\n\
             u7,2024-01-01,7.0,70,2.0\n\
             u7,2024-01-02,8.0,72,2.5\n\
             u7,2024-01-03,3.5,68,\n",
        );
        let record = process_upload(&engine, &t, Some("health.csv".into()))
            .await
            .unwrap();
        assert_eq!(record.user_id, "u7");
        assert_eq!(record.summary.total_users, 1);
        assert_eq!(record.summary.records, 3);
        assert_eq!(record.summary.heart_rate_avg_7d, Some(70.0));
        assert_eq!(record.summary.water_avg_7d, Some(2.3));
        assert_eq!(record.summary.steps_avg_7d, None);
        assert_eq!(record.trends.len(), 3);
        assert_eq!(record.timeseries.len(), 8);
        assert_eq!(record.anomalies.len(), 1);
        assert_eq!(record.anomalies[0].reason, "Urgent: less than 4 hours of sleep");
        assert_eq!(record.insights.analysis_type, AnalysisType::RuleBased);
    }

    #[tokio::test]
    async fn table_without_known_metrics_gives_empty_record() {
        let engine = InsightEngine::rule_based(AnalysisConfig::default());
        let t = table("date,mood\n2024-01-01,good\n");
        let record = process_upload(&engine, &t, None).await.unwrap();
        assert_eq!(record.user_id, "unknown");
        assert!(record.timeseries.is_empty());
        assert_eq!(record.insights, InsightResult::empty(AnalysisType::RuleBased));
    }

    #[test]
    fn summary_omits_absent_metrics() {
        let summary = UploadSummary {
            total_users: 1,
            records: 2,
            sleep_avg_7d: Some(7.1),
            ..UploadSummary::default()
        };
        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["sleep_avg_7d"], 7.1);
        assert!(v.get("steps_avg_7d").is_none());
    }
}
