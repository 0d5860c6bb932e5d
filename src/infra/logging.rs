pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Logs go to stderr: in stdio mode stdout carries the protocol.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Record a metric through the `metrics` facade and mirror it as a log line.
/// Names ending in `_total` are counters, everything else a histogram.
pub fn log_metric(op: &'static str, metric: &'static str, value: f64) {
    tracing::info!(op = op, metric = metric, value = value, "metric");
    if metric.ends_with("_total") {
        metrics::counter!(metric, "op" => op).increment(value as u64);
    } else {
        metrics::histogram!(metric, "op" => op).record(value);
    }
}
