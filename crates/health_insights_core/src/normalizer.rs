//! Metric normalization
//!
//! Converts a row-parsed CSV export into a [`HealthDataset`]. Two input shapes
//! are supported and detected by an explicit classification step:
//! - long form: a `metric` column naming the metric and a `value` column
//! - wide form: one column per metric, one row per time point
//!
//! Column names map to metric kinds through a fixed lookup table; unknown
//! names are skipped. Hydration is converted to liters.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::InsightError;
use crate::types::{HealthDataset, MetricKind, RawTable};
use crate::utils::{DEFAULT_DATE_FORMAT, parse_observation_date, parse_value};

/// Candidate names for the date column, in priority order.
pub const DATE_COLUMNS: [&str; 4] = ["date", "day", "timestamp", "datetime"];

/// Above this many "liters" per day a generic hydration value is read as mL.
const HYDRATION_ML_THRESHOLD: f64 = 20.0;

/// Caller preference for shape detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapeHint {
    #[default]
    Auto,
    Long,
    Wide,
}

/// How raw values of a column convert into canonical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueUnit {
    Canonical,
    Milliliters,
    /// Liters unless the magnitude only makes sense as milliliters.
    LitersOrMilliliters,
}

impl ValueUnit {
    fn to_canonical(self, value: f64) -> f64 {
        match self {
            ValueUnit::Canonical => value,
            ValueUnit::Milliliters => value / 1000.0,
            ValueUnit::LitersOrMilliliters if value > HYDRATION_ML_THRESHOLD => value / 1000.0,
            ValueUnit::LitersOrMilliliters => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub kind: MetricKind,
    pub unit: ValueUnit,
}

/// Fixed lookup from a column or metric name to its metric kind.
pub fn lookup_metric(name: &str) -> Option<ColumnMapping> {
    let name = name.trim().to_ascii_lowercase();
    let (kind, unit) = match name.as_str() {
        "sleep" | "sleep_hours" | "duration_hours" => (MetricKind::Sleep, ValueUnit::Canonical),
        "heart_rate" | "hr" | "resting_heart_rate" => (MetricKind::HeartRate, ValueUnit::Canonical),
        "water_liters" => (MetricKind::Hydration, ValueUnit::Canonical),
        "water_ml" => (MetricKind::Hydration, ValueUnit::Milliliters),
        "water" | "hydration" => (MetricKind::Hydration, ValueUnit::LitersOrMilliliters),
        "steps" | "step_count" => (MetricKind::Steps, ValueUnit::Canonical),
        _ => return None,
    };
    Some(ColumnMapping { kind, unit })
}

/// Result of shape classification: column indices for each role.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetShape {
    Long {
        date: usize,
        metric: usize,
        value: usize,
    },
    Wide {
        date: usize,
        columns: Vec<(usize, ColumnMapping)>,
    },
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// chrono format string for the date column.
    pub date_format: String,
    pub shape: ShapeHint,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            shape: ShapeHint::Auto,
        }
    }
}

impl NormalizeOptions {
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_shape(mut self, shape: ShapeHint) -> Self {
        self.shape = shape;
        self
    }
}

pub struct Normalizer;

impl Normalizer {
    /// Decide which shape the table has.
    ///
    /// A table without a date column cannot yield any observation and is
    /// reported as [`InsightError::EmptyDataset`]. Forcing a shape the table
    /// cannot satisfy is a [`InsightError::ShapeMismatch`].
    pub fn classify(table: &RawTable, hint: ShapeHint) -> Result<DatasetShape, InsightError> {
        let date = DATE_COLUMNS
            .iter()
            .find_map(|name| table.column_index(name))
            .ok_or(InsightError::EmptyDataset)?;

        let long_columns = table
            .column_index("metric")
            .zip(table.column_index("value"));

        match (hint, long_columns) {
            (ShapeHint::Auto | ShapeHint::Long, Some((metric, value))) => {
                Ok(DatasetShape::Long {
                    date,
                    metric,
                    value,
                })
            }
            (ShapeHint::Long, None) => Err(InsightError::ShapeMismatch(
                "long form requires `metric` and `value` columns".into(),
            )),
            (ShapeHint::Auto | ShapeHint::Wide, _) => {
                let columns: Vec<(usize, ColumnMapping)> = table
                    .headers
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != date)
                    .filter_map(|(idx, header)| match lookup_metric(header) {
                        Some(mapping) => Some((idx, mapping)),
                        None => {
                            debug!(column = %header, "ignoring unknown metric column");
                            None
                        }
                    })
                    .collect();
                if columns.is_empty() {
                    if hint == ShapeHint::Wide {
                        return Err(InsightError::ShapeMismatch(
                            "wide form requires at least one known metric column".into(),
                        ));
                    }
                    return Err(InsightError::EmptyDataset);
                }
                Ok(DatasetShape::Wide { date, columns })
            }
        }
    }

    /// Normalize a table into a dataset with every series sorted by date.
    ///
    /// Rows whose date fails to parse are skipped; cells without a usable
    /// value are excluded from that metric only. Zero surviving observations
    /// yields [`InsightError::EmptyDataset`].
    pub fn normalize(
        table: &RawTable,
        options: &NormalizeOptions,
    ) -> Result<HealthDataset, InsightError> {
        let shape = Self::classify(table, options.shape)?;
        let mut dataset = HealthDataset::new();
        let mut skipped_dates = 0usize;
        let mut unknown_metrics = BTreeSet::new();
        let date_column = match &shape {
            DatasetShape::Long { date, .. } | DatasetShape::Wide { date, .. } => *date,
        };

        for row in 0..table.row_count() {
            let Some(date) = table
                .cell(row, date_column)
                .and_then(|raw| parse_observation_date(raw, &options.date_format))
            else {
                skipped_dates += 1;
                continue;
            };

            match &shape {
                DatasetShape::Long { metric, value, .. } => {
                    let Some(name) = table.cell(row, *metric) else {
                        continue;
                    };
                    let Some(mapping) = lookup_metric(name) else {
                        unknown_metrics.insert(name.to_ascii_lowercase());
                        continue;
                    };
                    if let Some(v) = table.cell(row, *value).and_then(parse_value) {
                        dataset.record(mapping.kind, date, mapping.unit.to_canonical(v));
                    }
                }
                DatasetShape::Wide { columns, .. } => {
                    for (idx, mapping) in columns {
                        if let Some(v) = table.cell(row, *idx).and_then(parse_value) {
                            dataset.record(mapping.kind, date, mapping.unit.to_canonical(v));
                        }
                    }
                }
            }
        }

        if !unknown_metrics.is_empty() {
            debug!(?unknown_metrics, "ignored unknown metric names");
        }
        debug!(
            rows = table.row_count(),
            skipped_dates,
            observations = dataset.observation_count(),
            "normalized dataset"
        );

        if dataset.is_empty() {
            return Err(InsightError::EmptyDataset);
        }
        dataset.sort_all();
        Ok(dataset)
    }
}
