//! Date parsing and small numeric helpers shared by the pipeline stages.

use chrono::NaiveDate;

/// Default date format for CSV exports.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an observation date using `format`, falling back to common
/// datetime shapes and keeping only the calendar date.
///
/// Accepts:
/// - a value matching `format` exactly
/// - naive datetimes `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`
/// - RFC3339 datetimes (local date of the given offset)
pub fn parse_observation_date(s: &str, format: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, format) {
        return Some(d);
    }
    for dt_format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, dt_format) {
            return Some(ndt.date());
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

/// Parse a numeric cell. Placeholder tokens for missing data yield `None`.
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || ["na", "n/a", "nan", "null", "none", "-"]
            .iter()
            .any(|t| s.eq_ignore_ascii_case(t))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_configured_format() {
        let d = parse_observation_date("15-12-2025", "%d-%m-%Y").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn falls_back_to_datetime_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        assert_eq!(
            parse_observation_date("2025-12-15T10:30:00", DEFAULT_DATE_FORMAT),
            Some(expected)
        );
        assert_eq!(
            parse_observation_date("2025-12-15 07:05:00", DEFAULT_DATE_FORMAT),
            Some(expected)
        );
        assert_eq!(
            parse_observation_date("2025-12-15T10:30:00Z", DEFAULT_DATE_FORMAT),
            Some(expected)
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(parse_observation_date("not-a-date", DEFAULT_DATE_FORMAT).is_none());
        assert!(parse_observation_date("2025-13-40", DEFAULT_DATE_FORMAT).is_none());
    }

    #[test]
    fn parse_value_handles_placeholders() {
        assert_eq!(parse_value("7.5"), Some(7.5));
        assert_eq!(parse_value(" NaN "), None);
        assert_eq!(parse_value("NA"), None);
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("-3"), Some(-3.0));
    }
}
