//! Metric names and recording helpers. Recording goes through the `metrics`
//! facade and is a no-op until a binary installs a recorder.

use std::time::Duration;

use crate::types::AnalysisType;

pub const GENERATIONS_TOTAL: &str = "health_insights_generations_total";
pub const GENERATION_SECONDS: &str = "health_insights_generation_seconds";
pub const ANALYSES_TOTAL: &str = "health_insights_analyses_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Ok,
    Error,
    Timeout,
}

impl GenerationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOutcome::Ok => "ok",
            GenerationOutcome::Error => "error",
            GenerationOutcome::Timeout => "timeout",
        }
    }
}

pub fn record_generation(outcome: GenerationOutcome, elapsed: Duration) {
    metrics::counter!(GENERATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!(GENERATION_SECONDS).record(elapsed.as_secs_f64());
}

pub fn record_analysis(analysis_type: AnalysisType) {
    metrics::counter!(ANALYSES_TOTAL, "analysis_type" => analysis_type.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(GenerationOutcome::Ok.as_str(), "ok");
        assert_eq!(GenerationOutcome::Timeout.as_str(), "timeout");
        // without an installed recorder these are no-ops
        record_generation(GenerationOutcome::Error, Duration::from_millis(5));
        record_analysis(AnalysisType::RuleBased);
    }
}
