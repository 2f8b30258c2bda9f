use health_insights_core::InsightEngine;
use health_insights_server::telemetry::{init_tracing, log_filter_from_env};
use health_insights_server::{AppState, ServerConfig, build_router};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let log_env = log_filter_from_env();
    init_tracing(&log_env);
    info!(%log_env, "health_insights:http: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    // Without GEMINI_API_KEY every upload is analyzed by the rule engine.
    let engine = InsightEngine::from_env();
    let config = ServerConfig::from_env();
    let state = AppState::new(engine).with_metrics(handle);
    let app = build_router(state, config.max_body_size);

    let addr = config.address;
    info!(%addr, max_body_bytes = config.max_body_size, "starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to install ctrl+c handler: {e}");
            }
        })
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
