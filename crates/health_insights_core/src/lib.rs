//! Health insight pipeline: turns tabular health exports into per-metric
//! statistics, natural-language insights and lifestyle recommendations.
//!
//! The stages are, leaves first:
//! - [`normalizer`]: wide or long tables into a [`HealthDataset`]
//! - [`summarizer`]: descriptive statistics per metric
//! - [`prompts`]: bounded per-metric and recommendation prompts
//! - [`TextGenerator`]: the replaceable text-generation client
//! - [`aggregator`]: the [`InsightEngine`] orchestrating the above
//! - [`fallback`]: deterministic threshold rules with the same output shape

use std::sync::Arc;

use async_trait::async_trait;

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod middleware;
pub mod normalizer;
pub mod observability;
pub mod prompts;
pub mod retry;
pub mod stub;
pub mod summarizer;
pub mod types;
pub mod utils;

pub use aggregator::InsightEngine;
pub use config::{AnalysisConfig, LlmConfig};
pub use error::{GenerationError, InsightError};
pub use normalizer::{NormalizeOptions, Normalizer, ShapeHint};
pub use types::{
    AnalysisType, HealthDataset, Insight, InsightResult, MetricKind, MetricSeries, MetricStats,
    Observation, RawTable, Severity, Trend,
};

/// A text-generation service: one prompt in, generated text or a typed
/// failure out.
///
/// Implementations perform a single best-effort attempt per call and never
/// return partial output. Deadlines and retries are added by wrapping, see
/// [`middleware::InstrumentedGenerator`] and [`retry::RetryingGenerator`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "generator"
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::FixedTextGenerator;

    #[tokio::test]
    async fn arc_generator_delegates() {
        let generator: Arc<dyn TextGenerator> = Arc::new(FixedTextGenerator::new("hi"));
        assert_eq!(generator.generate("p").await.unwrap(), "hi");
        assert_eq!(generator.name(), "fixed");
    }

    #[test]
    fn insight_result_json_round_trip() {
        let result = InsightResult {
            insights: vec![
                Insight::Text("Sleep has been steady around 7 hours.".into()),
                Insight::Rated {
                    message: "Low hydration".into(),
                    severity: Severity::Warning,
                },
            ],
            recommendations: vec!["Drink more water".into()],
            analysis_type: AnalysisType::LlmPowered,
            context_period: "2024-01-01 to 2024-01-10".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["analysis_type"], "llm_powered");
        assert_eq!(json["insights"][0], "Sleep has been steady around 7 hours.");
        assert_eq!(json["insights"][1]["severity"], "warning");
        let back: InsightResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
