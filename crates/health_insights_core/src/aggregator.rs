//! The insight engine: normalize, summarize, prompt, generate and assemble.
//!
//! Per-metric generations run concurrently and are joined before the single
//! recommendations call. Any generation failure only removes that metric's
//! insight; when every metric fails the engine answers with the rule-based
//! result instead.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, LlmConfig};
use crate::http_client::GeminiTextGenerator;
use crate::middleware::InstrumentedGenerator;
use crate::normalizer::{NormalizeOptions, Normalizer, ShapeHint};
use crate::observability::record_analysis;
use crate::retry::{RetryPolicy, RetryingGenerator};
use crate::summarizer::{summarize, union_period};
use crate::types::{
    AnalysisType, HealthDataset, Insight, InsightResult, MetricKind, MetricStats, RawTable,
};
use crate::{InsightError, TextGenerator, fallback, prompts};

pub struct InsightEngine {
    generator: Option<Arc<dyn TextGenerator>>,
    config: AnalysisConfig,
}

impl InsightEngine {
    /// An engine that always uses the threshold rules.
    pub fn rule_based(config: AnalysisConfig) -> Self {
        Self {
            generator: None,
            config,
        }
    }

    /// An engine backed by `generator`, used as given.
    pub fn with_generator(generator: Arc<dyn TextGenerator>, config: AnalysisConfig) -> Self {
        Self {
            generator: Some(generator),
            config,
        }
    }

    /// Build the Gemini-backed engine, or a rule-based one when the
    /// credential is missing or the client cannot be constructed. The
    /// choice is made once and holds for the engine's lifetime.
    pub fn from_config(llm: Result<LlmConfig, InsightError>, config: AnalysisConfig) -> Self {
        let llm = match llm {
            Ok(llm) => llm,
            Err(e) => {
                warn!("text generation disabled, using rule-based insights: {}", e);
                return Self::rule_based(config);
            }
        };
        let gemini = match GeminiTextGenerator::from_config(&llm) {
            Ok(client) => client,
            Err(e) => {
                warn!("failed to build text-generation client: {}", e);
                return Self::rule_based(config);
            }
        };
        info!(model = %gemini.model(), timeout = ?llm.timeout, retries = llm.max_retries, "text generation enabled");
        let instrumented = InstrumentedGenerator::new(gemini, llm.timeout);
        let generator: Arc<dyn TextGenerator> = if llm.max_retries > 0 {
            Arc::new(RetryingGenerator::new(
                instrumented,
                RetryPolicy::with_retries(llm.max_retries),
            ))
        } else {
            Arc::new(instrumented)
        };
        Self::with_generator(generator, config)
    }

    pub fn from_env() -> Self {
        Self::from_config(LlmConfig::from_env(), AnalysisConfig::from_env())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analysis type reported when nothing could be analyzed.
    pub fn default_analysis_type(&self) -> AnalysisType {
        if self.generator.is_some() {
            AnalysisType::LlmPowered
        } else {
            AnalysisType::RuleBased
        }
    }

    /// Normalize `table` and analyze it. An empty dataset yields an empty
    /// result; a forced shape the table cannot satisfy is an input error.
    pub async fn analyze_table(
        &self,
        table: &RawTable,
        shape: ShapeHint,
    ) -> Result<InsightResult, InsightError> {
        let options = NormalizeOptions::default()
            .with_date_format(self.config.date_format.clone())
            .with_shape(shape);
        match Normalizer::normalize(table, &options) {
            Ok(dataset) => Ok(self.analyze(&dataset).await),
            Err(InsightError::EmptyDataset) => {
                warn!("no parseable rows for any known metric");
                Ok(InsightResult::empty(self.default_analysis_type()))
            }
            Err(e) => Err(e),
        }
    }

    /// Statistics for each known metric with at least one observation, in
    /// canonical order.
    pub fn summarize_all(&self, dataset: &HealthDataset) -> Vec<MetricStats> {
        dataset
            .iter()
            .filter(|s| s.kind != MetricKind::Unknown)
            .map(|s| summarize(s, self.config.window_days))
            .filter(|s| s.count > 0)
            .collect()
    }

    pub async fn analyze(&self, dataset: &HealthDataset) -> InsightResult {
        let stats = self.summarize_all(dataset);
        let result = if stats.is_empty() {
            InsightResult::empty(self.default_analysis_type())
        } else {
            match &self.generator {
                None => fallback::analyze(&stats),
                Some(generator) => match generate_insights(&**generator, &stats).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("{}; falling back to rule-based insights", e);
                        fallback::analyze(&stats)
                    }
                },
            }
        };
        info!(
            analysis_type = result.analysis_type.as_str(),
            insights = result.insights.len(),
            recommendations = result.recommendations.len(),
            "analysis complete"
        );
        record_analysis(result.analysis_type);
        result
    }
}

async fn generate_insights(
    generator: &dyn TextGenerator,
    stats: &[MetricStats],
) -> Result<InsightResult, InsightError> {
    let calls = stats.iter().map(|s| {
        let prompt = prompts::metric_prompt(s);
        async move { (s.kind, generator.generate(&prompt).await) }
    });
    let mut insights = Vec::new();
    for (kind, outcome) in join_all(calls).await {
        match outcome {
            Ok(text) => {
                debug!(metric = kind.as_str(), "insight generated");
                insights.push(text);
            }
            Err(e) => warn!(metric = kind.as_str(), "insight generation failed: {}", e),
        }
    }
    if insights.is_empty() {
        return Err(InsightError::AllGenerationsFailed {
            attempted: stats.len(),
        });
    }

    let recommendations = match generator
        .generate(&prompts::recommendations_prompt(&insights))
        .await
    {
        Ok(text) => prompts::split_recommendations(&text),
        Err(e) => {
            warn!("recommendation generation failed: {}", e);
            Vec::new()
        }
    };

    Ok(InsightResult {
        insights: insights.into_iter().map(Insight::Text).collect(),
        recommendations,
        analysis_type: AnalysisType::LlmPowered,
        context_period: union_period(stats),
    })
}
