use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;

use crate::InsightError;
use crate::http_client::GenerationConfig;
use crate::utils::DEFAULT_DATE_FORMAT;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the text-generation service.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    /// Deadline imposed on every generation call.
    pub timeout: Duration,
    /// Retries at the client boundary; zero means a single attempt.
    pub max_retries: u32,
    pub generation: GenerationConfig,
}

impl LlmConfig {
    /// Defaults for everything except the credential.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            generation: GenerationConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, InsightError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, InsightError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api = get("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InsightError::CredentialMissing("GEMINI_API_KEY missing".into()))?;
        let mut cfg = Self::new(SecretString::new(api.trim().into()));
        if let Some(model) = get("HEALTH_INSIGHTS_MODEL").filter(|m| !m.is_empty()) {
            cfg.model = model;
        }
        if let Some(base_url) = get("HEALTH_INSIGHTS_LLM_BASE_URL").filter(|u| !u.is_empty()) {
            cfg.base_url = base_url;
        }
        cfg.timeout = Duration::from_secs(parse_or(
            &mut get,
            "HEALTH_INSIGHTS_LLM_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        ));
        cfg.max_retries = parse_or(&mut get, "HEALTH_INSIGHTS_LLM_RETRIES", 0);
        let defaults = GenerationConfig::default();
        cfg.generation = GenerationConfig {
            temperature: parse_or(
                &mut get,
                "HEALTH_INSIGHTS_LLM_TEMPERATURE",
                defaults.temperature,
            ),
            max_output_tokens: parse_or(
                &mut get,
                "HEALTH_INSIGHTS_LLM_MAX_TOKENS",
                defaults.max_output_tokens,
            ),
        };
        Ok(cfg)
    }
}

/// Normalizer and summarizer settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Summarize only the most recent N days; `None` uses all data.
    pub window_days: Option<u32>,
    pub date_format: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: None,
            date_format: DEFAULT_DATE_FORMAT.into(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let window_days = get("HEALTH_INSIGHTS_WINDOW_DAYS").and_then(|raw| {
            match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => {
                    warn!(value = %raw, "ignoring invalid HEALTH_INSIGHTS_WINDOW_DAYS");
                    None
                }
                Ok(days) => Some(days),
            }
        });
        let date_format = get("HEALTH_INSIGHTS_DATE_FORMAT")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.into());
        Self {
            window_days,
            date_format,
        }
    }
}

/// Parse `key` or fall back to `default`, warning on unparseable input.
fn parse_or<F, T>(get: &mut F, key: &str, default: T) -> T
where
    F: FnMut(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "invalid value, using default");
            default
        }),
    }
}
