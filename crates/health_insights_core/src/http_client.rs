//! HTTP client for the Gemini `generateContent` REST API.
//!
//! This module provides a reqwest-based implementation of the
//! [`TextGenerator`](crate::TextGenerator) trait. It performs exactly one
//! request per call; deadlines and retries are layered on top by
//! [`crate::middleware`] and [`crate::retry`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::{GenerationError, TextGenerator};

/// Client for the Gemini API using reqwest.
#[derive(Clone, Debug)]
pub struct GeminiTextGenerator {
    base_url: String,
    model: String,
    api_key: SecretString,
    generation_config: GenerationConfig,
    client: reqwest::Client,
}

/// Sampling parameters sent with every request.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_output_tokens: 512,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiTextGenerator {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://generativelanguage.googleapis.com"
    /// * `model` - model name, e.g. "gemini-2.5-flash"
    /// * `api_key` - credential sent in the `x-goog-api-key` header
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            generation_config: GenerationConfig::default(),
            client,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        Ok(
            Self::new(&config.base_url, config.model.clone(), config.api_key.clone())?
                .with_generation_config(config.generation.clone()),
        )
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Extract error information from a failed response.
    async fn error_from_response(resp: reqwest::Response) -> GenerationError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(256).collect());

        match status {
            401 | 403 => GenerationError::Auth(message),
            429 => GenerationError::RateLimited(message),
            _ => GenerationError::Api { status, message },
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: &self.generation_config,
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generateContent");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        let body = resp.text().await?;
        extract_text(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
