//! Logging setup shared by both binaries.

/// Filter source, in priority order: `HEALTH_INSIGHTS_LOG_LEVEL`, `RUST_LOG`,
/// then `info`.
pub fn log_filter_from_env() -> String {
    resolve_log_filter(|k| std::env::var(k).ok())
}

pub fn resolve_log_filter<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("HEALTH_INSIGHTS_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Install a compact subscriber writing to stderr. An invalid filter falls
/// back to `info`.
pub fn init_tracing(log_env: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}
