use clap::Parser;
use health_insights_server::cli::{Cli, analyze_file, render_report};
use health_insights_server::telemetry::{init_tracing, log_filter_from_env};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays parseable.
    let log_env = log_filter_from_env();
    init_tracing(&log_env);
    tracing::info!("health_insights: log filter: {}", log_env);

    let engine = cli.engine();
    let (rows, result) = analyze_file(&cli, &engine).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Loaded {} rows from {}\n", rows, cli.data_file.display());
        print!("{}", render_report(&result));
    }
    Ok(())
}
