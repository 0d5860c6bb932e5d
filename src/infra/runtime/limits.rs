use std::time::Duration;

use crate::infra::config::ProviderConfig;

/// Build the provider HTTP client with the configured timeouts.
pub fn make_http_client(cfg: &ProviderConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
}

/// Exponential backoff for async ops. Only errors accepted by `should_retry`
/// are retried; anything else returns immediately.
///
/// Lives outside the provider adapter: callers layer it on when they want a
/// retry policy.
pub async fn retry_async<T, E, Fut, F, P>(mut attempts: u32, should_retry: P, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut try_num: u32 = 0;
    let mut delay_ms: u64 = 50;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !should_retry(&e) {
                    return Err(e);
                }
                attempts -= 1;
                tracing::debug!(attempt = try_num, delay_ms, "retrying after retryable failure");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(1_000);
                try_num += 1;
            }
        }
    }
}
