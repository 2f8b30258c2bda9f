//! Data model shared by every stage of the insight pipeline.
//!
//! Raw tabular input ([`RawTable`]) is normalized into a [`HealthDataset`],
//! summarized into [`MetricStats`] and finally rendered as an
//! [`InsightResult`], the only shape consumers ever see.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classified category of a health time series.
///
/// Variant order is the canonical processing order; `Ord` is derived so that
/// ordered maps iterate Sleep, HeartRate, Hydration, Steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Sleep,
    HeartRate,
    Hydration,
    Steps,
    #[serde(other)]
    Unknown,
}

impl MetricKind {
    /// Known kinds in canonical order.
    pub const CANONICAL: [MetricKind; 4] = [
        MetricKind::Sleep,
        MetricKind::HeartRate,
        MetricKind::Hydration,
        MetricKind::Steps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Sleep => "sleep",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::Hydration => "hydration",
            MetricKind::Steps => "steps",
            MetricKind::Unknown => "unknown",
        }
    }

    /// Human readable label used in prompts and rule messages.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Sleep => "sleep duration",
            MetricKind::HeartRate => "resting heart rate",
            MetricKind::Hydration => "daily water intake",
            MetricKind::Steps => "daily step count",
            MetricKind::Unknown => "unknown metric",
        }
    }

    /// Canonical unit of the normalized values.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Sleep => "hours",
            MetricKind::HeartRate => "bpm",
            MetricKind::Hydration => "liters",
            MetricKind::Steps => "steps",
            MetricKind::Unknown => "",
        }
    }

    /// Trend polarity. Resting heart rate improves when it goes down.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::HeartRate)
    }
}

/// One dated measurement in canonical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered time series for a single metric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub kind: MetricKind,
    pub observations: Vec<Observation>,
}

impl MetricSeries {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            observations: Vec::new(),
        }
    }

    pub fn from_values(kind: MetricKind, observations: Vec<Observation>) -> Self {
        let mut series = Self { kind, observations };
        series.sort();
        series
    }

    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.observations.push(Observation { date, value });
    }

    /// Stable sort by date: same-day observations keep their input order.
    pub fn sort(&mut self) {
        self.observations.sort_by_key(|o| o.date);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

/// Per-request mapping from metric kind to its series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDataset {
    series: BTreeMap<MetricKind, MetricSeries>,
}

impl HealthDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: MetricKind, date: NaiveDate, value: f64) {
        self.series
            .entry(kind)
            .or_insert_with(|| MetricSeries::new(kind))
            .push(date, value);
    }

    pub fn get(&self, kind: MetricKind) -> Option<&MetricSeries> {
        self.series.get(&kind)
    }

    /// Series in canonical metric order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSeries> {
        self.series.values()
    }

    pub fn kinds(&self) -> Vec<MetricKind> {
        self.series.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(MetricSeries::is_empty)
    }

    pub fn observation_count(&self) -> usize {
        self.series.values().map(MetricSeries::len).sum()
    }

    pub(crate) fn sort_all(&mut self) {
        self.series.values_mut().for_each(MetricSeries::sort);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient data",
        }
    }
}

/// Immutable snapshot of descriptive statistics over the canonical window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub kind: MetricKind,
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub trend: Trend,
    /// Second-half mean relative to first-half mean, in percent.
    pub change_percent: Option<f64>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Human readable date range, `N/A` when empty.
    pub window: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Caution,
    Info,
}

/// A single insight: free text from the generator, or a severity-tagged
/// message from the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insight {
    Text(String),
    Rated { message: String, severity: Severity },
}

impl Insight {
    pub fn message(&self) -> &str {
        match self {
            Insight::Text(text) => text,
            Insight::Rated { message, .. } => message,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Insight::Text(_) => None,
            Insight::Rated { severity, .. } => Some(*severity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    LlmPowered,
    RuleBased,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::LlmPowered => "llm_powered",
            AnalysisType::RuleBased => "rule_based",
        }
    }
}

/// Externally visible analysis output, identical in shape for both paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    pub analysis_type: AnalysisType,
    pub context_period: String,
}

/// Context period used when no metric contributed a window.
pub const NO_PERIOD: &str = "N/A";

impl InsightResult {
    pub fn empty(analysis_type: AnalysisType) -> Self {
        Self {
            insights: Vec::new(),
            recommendations: Vec::new(),
            analysis_type,
            context_period: NO_PERIOD.to_string(),
        }
    }
}

/// Row-parsed tabular input with named columns. Missing cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(|h| h.into().trim().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; blank cells are stored as missing.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row = cells
            .into_iter()
            .map(|c| {
                let c = c.as_ref().trim();
                if c.is_empty() { None } else { Some(c.to_string()) }
            })
            .collect();
        self.rows.push(row);
    }

    /// Case-insensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn dataset_iterates_in_canonical_order() {
        let mut ds = HealthDataset::new();
        ds.record(MetricKind::Steps, day(1), 8000.0);
        ds.record(MetricKind::Hydration, day(1), 2.0);
        ds.record(MetricKind::Sleep, day(1), 7.0);
        ds.record(MetricKind::HeartRate, day(1), 70.0);
        let kinds: Vec<_> = ds.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, MetricKind::CANONICAL.to_vec());
    }

    #[test]
    fn series_sort_is_stable_for_same_day() {
        let mut s = MetricSeries::new(MetricKind::HeartRate);
        s.push(day(2), 80.0);
        s.push(day(1), 72.0);
        s.push(day(2), 85.0);
        s.sort();
        let values: Vec<f64> = s.observations.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![72.0, 80.0, 85.0]);
    }

    #[test]
    fn insight_serializes_untagged() {
        let text = Insight::Text("Sleep is steady.".into());
        assert_eq!(serde_json::to_value(&text).unwrap(), "Sleep is steady.");

        let rated = Insight::Rated {
            message: "Low hydration".into(),
            severity: Severity::Warning,
        };
        let v = serde_json::to_value(&rated).unwrap();
        assert_eq!(v["severity"], "warning");

        let back: Insight = serde_json::from_value(v).unwrap();
        assert_eq!(back, rated);
    }

    #[test]
    fn unknown_metric_kind_deserializes_to_unknown() {
        let kind: MetricKind = serde_json::from_str("\"blood_pressure\"").unwrap();
        assert_eq!(kind, MetricKind::Unknown);
    }

    #[test]
    fn raw_table_treats_blank_cells_as_missing() {
        let mut t = RawTable::new(["Date", "sleep_hours"]);
        t.push_row(["2024-01-01", "  "]);
        assert_eq!(t.column_index("date"), Some(0));
        assert_eq!(t.cell(0, 1), None);
        assert_eq!(t.cell(0, 0), Some("2024-01-01"));
    }
}
