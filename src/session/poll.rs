use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Re-run `check` every `interval` until it returns true or `max` elapses.
///
/// Returns whether the condition was met. `check` runs at least once.
pub async fn poll_until<F, Fut>(mut check: F, interval: Duration, max: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + max;
    loop {
        if check().await {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(interval.min(deadline - now)).await;
    }
}
