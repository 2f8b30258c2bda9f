//! Command line analyzer: one CSV file in, a report or JSON result out.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use health_insights_core::{
    AnalysisConfig, AnalysisType, Insight, InsightEngine, InsightResult, LlmConfig, Severity,
    ShapeHint,
};

use crate::csv_input::read_table_from_path;

#[derive(Parser, Debug)]
#[command(
    name = "health-insights",
    about = "Analyze a health CSV export",
    long_about = "Normalize a sleep/heart-rate/hydration/steps CSV export, summarize each metric and print generated or rule-based insights"
)]
pub struct Cli {
    /// Path to the CSV export
    #[arg(long)]
    pub data_file: PathBuf,

    /// Table layout; `auto` detects long form by its `metric`/`value` columns
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,

    /// chrono format of the date column (default `%Y-%m-%d`)
    #[arg(long)]
    pub date_format: Option<String>,

    /// Only summarize the most recent N days
    #[arg(long)]
    pub window_days: Option<u32>,

    /// Text-generation API key; without one the rule engine is used
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Auto,
    Long,
    Wide,
}

impl From<Format> for ShapeHint {
    fn from(format: Format) -> Self {
        match format {
            Format::Auto => ShapeHint::Auto,
            Format::Long => ShapeHint::Long,
            Format::Wide => ShapeHint::Wide,
        }
    }
}

impl Cli {
    /// Environment configuration with command line overrides applied.
    pub fn analysis_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::from_env();
        if let Some(format) = &self.date_format {
            config.date_format = format.clone();
        }
        if let Some(days) = self.window_days {
            config.window_days = (days > 0).then_some(days);
        }
        config
    }

    pub fn engine(&self) -> InsightEngine {
        let llm = LlmConfig::from_env_with(|k| match k {
            "GEMINI_API_KEY" => self.api_key.clone(),
            other => std::env::var(other).ok(),
        });
        InsightEngine::from_config(llm, self.analysis_config())
    }
}

/// Read the file named by `cli` and analyze it with `engine`.
pub async fn analyze_file(
    cli: &Cli,
    engine: &InsightEngine,
) -> anyhow::Result<(usize, InsightResult)> {
    let table = read_table_from_path(&cli.data_file)?;
    let result = engine.analyze_table(&table, cli.format.into()).await?;
    Ok((table.row_count(), result))
}

/// Human readable report of a result.
pub fn render_report(result: &InsightResult) -> String {
    let rule = "=".repeat(50);
    let title = match result.analysis_type {
        AnalysisType::LlmPowered => "HEALTH INSIGHTS (generated)",
        AnalysisType::RuleBased => "HEALTH INSIGHTS (rule-based)",
    };
    let mut lines = vec![rule.clone(), title.to_string(), rule.clone()];
    if result.insights.is_empty() {
        lines.push("\nNo insights generated.".to_string());
    }
    for (i, insight) in result.insights.iter().enumerate() {
        let line = match insight {
            Insight::Text(text) => format!("\n{}. {}", i + 1, text),
            Insight::Rated { message, severity } => {
                let label = match severity {
                    Severity::Good => "good",
                    Severity::Warning => "warning",
                    Severity::Caution => "caution",
                    Severity::Info => "info",
                };
                format!("\n{}. [{}] {}", i + 1, label, message)
            }
        };
        lines.push(line);
    }

    lines.push(format!("\n{rule}\nLIFESTYLE RECOMMENDATIONS\n{rule}"));
    if result.recommendations.is_empty() {
        lines.push("\nNo recommendations generated.".to_string());
    }
    for (i, rec) in result.recommendations.iter().enumerate() {
        lines.push(format!("\n{}. {}", i + 1, rec));
    }

    lines.push(format!("\nAnalysis Type: {}", result.analysis_type.as_str()));
    lines.push(format!("Context Period: {}", result.context_period));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
