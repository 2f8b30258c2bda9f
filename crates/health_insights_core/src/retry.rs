use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{GenerationError, TextGenerator};

/// A simple retry policy with exponential backoff and jitter.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Run `f` until it succeeds, `should_retry` rejects the error, or the
    /// retry budget is spent.
    pub async fn retry_async<F, Fut, T, E, P>(&self, mut f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    // exponential backoff with jitter
                    let max_delay = self.base_delay * (1u32 << attempt.min(16));
                    let max_ms = (max_delay.as_millis() as u64).max(1);
                    let jitter = rand::random_range(0..max_ms);
                    tokio::time::sleep(Duration::from_millis(jitter)).await;
                }
            }
        }
    }
}

/// Retries retryable failures of the inner generator. Authentication and
/// other permanent errors are returned immediately.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.policy
            .retry_async(
                || self.inner.generate(prompt),
                |e: &GenerationError| {
                    let retry = e.is_retryable();
                    if retry {
                        debug!("retrying generation after error: {}", e);
                    }
                    retry
                },
            )
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
