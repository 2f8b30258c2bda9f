//! Cross-cutting wrapper around a [`TextGenerator`]: deadline, tracing and
//! metrics.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::observability::{GenerationOutcome, record_generation};
use crate::{GenerationError, TextGenerator};

/// Imposes a deadline on every call of the inner generator, so that a request
/// which never returns cannot hold up an analysis indefinitely.
pub struct InstrumentedGenerator<G> {
    inner: G,
    deadline: Duration,
}

impl<G: TextGenerator> InstrumentedGenerator<G> {
    pub fn new(inner: G, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for InstrumentedGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let start = Instant::now();
        let name = self.inner.name();
        debug!("Starting generation: {}", name);

        let result = match tokio::time::timeout(self.deadline, self.inner.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.deadline)),
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(text) => {
                debug!(
                    "Generation completed: {} in {:?} ({} chars)",
                    name,
                    elapsed,
                    text.len()
                );
                record_generation(GenerationOutcome::Ok, elapsed);
            }
            Err(e @ GenerationError::Timeout(_)) => {
                debug!("Generation timed out: {} - {}", name, e);
                record_generation(GenerationOutcome::Timeout, elapsed);
            }
            Err(e) => {
                debug!("Generation failed: {} in {:?} - error: {}", name, elapsed, e);
                record_generation(GenerationOutcome::Error, elapsed);
            }
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::FixedTextGenerator;

    struct NeverGenerator;

    #[async_trait]
    impl TextGenerator for NeverGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn passes_through_successful_generation() {
        let generator =
            InstrumentedGenerator::new(FixedTextGenerator::new("ok"), Duration::from_secs(1));
        assert_eq!(generator.generate("prompt").await.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn hung_generation_times_out() {
        let generator = InstrumentedGenerator::new(NeverGenerator, Duration::from_secs(30));
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == Duration::from_secs(30)));
    }
}
