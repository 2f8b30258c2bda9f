use health_insights_core::summarizer::summarize;
use health_insights_core::{
    MetricKind, MetricSeries, Observation, TextGenerator, config::LlmConfig,
    http_client::GeminiTextGenerator, prompts::metric_prompt,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects GEMINI_API_KEY in env
    let cfg = match LlmConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let client = GeminiTextGenerator::from_config(&cfg)?;

    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    let observations = [6.5, 7.2, 5.8, 6.0, 7.5, 8.1, 6.2, 7.0, 5.5, 6.8]
        .iter()
        .enumerate()
        .map(|(i, v)| Observation {
            date: start + chrono::Duration::days(i as i64),
            value: *v,
        })
        .collect();
    let stats = summarize(&MetricSeries::from_values(MetricKind::Sleep, observations), None);

    let insight = client.generate(&metric_prompt(&stats)).await?;
    println!("Sleep ({}): {}", stats.window, insight);
    Ok(())
}
