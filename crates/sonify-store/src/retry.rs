//! Exponential backoff for artifact writes: 100ms, 400ms, 1600ms.

use std::time::Duration;

pub const BACKOFF_MS: [u64; 3] = [100, 400, 1600];

/// Retries `op` up to `BACKOFF_MS.len() + 1` attempts total, sleeping the
/// configured backoff between attempts. Returns the last error if every
/// attempt fails.
pub async fn with_retry<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut last_err = None;
    for (attempt, delay_ms) in std::iter::once(0).chain(BACKOFF_MS.iter().copied()).enumerate() {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.expect("at least one attempt always runs"))
}
