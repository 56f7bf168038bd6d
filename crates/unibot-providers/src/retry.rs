//! Retries for transient provider failures.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;
use unibot_core::{
    context::Context, error::UnibotError, message::OutgoingMessage, traits::Provider,
};

const BASE_DELAY_MS: u64 = 500;
const MAX_DELAY_MS: u64 = 30_000;

/// Whether an error is worth retrying: transport failures, rate limits and 5xx.
pub fn is_transient(err: &UnibotError) -> bool {
    let UnibotError::Provider(msg) = err else {
        return false;
    };
    msg.contains("request failed") || msg.contains("returned 429") || msg.contains("returned 5")
}

/// Backoff before retry number `attempt + 1`, capped at 30s.
fn backoff_delay(attempt: u32) -> u64 {
    BASE_DELAY_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_DELAY_MS)
}

/// Run `op` up to `max_retries + 1` times with exponential backoff (500ms, 1s, 2s, ...).
pub async fn with_retries<T, F, Fut>(
    label: &str,
    max_retries: u32,
    mut op: F,
) -> Result<T, UnibotError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UnibotError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_transient(&e) => {
                let delay = backoff_delay(attempt);
                warn!("{label}: attempt {} failed, retrying in {delay}ms: {e}", attempt + 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Provider wrapper that retries transient failures.
pub struct RetryingProvider {
    inner: Box<dyn Provider>,
    max_retries: u32,
}

impl RetryingProvider {
    pub fn new(inner: Box<dyn Provider>, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, UnibotError> {
        with_retries(self.inner.name(), self.max_retries, || self.inner.complete(context)).await
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&UnibotError::Provider(
            "mistral returned 429 Too Many Requests: slow down".into()
        )));
        assert!(is_transient(&UnibotError::Provider(
            "openai returned 503 Service Unavailable: ".into()
        )));
        assert!(is_transient(&UnibotError::Provider(
            "gemini request failed: connection reset".into()
        )));
        assert!(!is_transient(&UnibotError::Provider(
            "openai returned 401 Unauthorized: bad key".into()
        )));
        assert!(!is_transient(&UnibotError::Config("x".into())));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        assert_eq!(backoff_delay(0), 500);
        assert_eq!(backoff_delay(2), 2_000);
        assert_eq!(backoff_delay(10), MAX_DELAY_MS);
        assert_eq!(backoff_delay(64), MAX_DELAY_MS);
        assert_eq!(backoff_delay(u32::MAX), MAX_DELAY_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", 2, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(UnibotError::Provider("x returned 500 Internal Server Error".into()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries("test", 2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UnibotError::Provider("x request failed: timeout".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries("test", 5, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UnibotError::Provider("x returned 400 Bad Request: nope".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
