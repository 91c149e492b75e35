use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON event logs for the long-lived server.
pub fn init_server_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(false)
        .init();
}

/// JSON event logs for Lambda. CloudWatch stamps every line already, and ANSI
/// escapes would show up verbatim there.
pub fn init_lambda_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();
}
