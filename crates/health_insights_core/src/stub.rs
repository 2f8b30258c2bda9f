//! Deterministic generators for tests, demos and offline runs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{GenerationError, TextGenerator};

/// Returns the same text for every prompt and records what it was asked.
#[derive(Debug, Default)]
pub struct FixedTextGenerator {
    text: String,
    prompts: Mutex<Vec<String>>,
}

impl FixedTextGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for FixedTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails every call with [`GenerationError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("generator disabled".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
