//! Script generation backends.
//!
//! [`HttpGenerationBackend`] speaks three request/response dialects, picked
//! from the endpoint URL, and retries failed calls with exponential backoff.
//! [`SampleBackend`] stands in when no endpoint is configured.

use std::sync::Arc;
use std::time::Duration;

use animforge_core::config::env_parse;
use animforge_core::error::CoreError;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::prompts::SAMPLE_SCRIPT;

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.2;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status code.
    #[error("backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per generation, including the first.
    pub max_retries: u32,
}

impl GenerationConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `AI_MODEL_ENDPOINT`      | unset   |
    /// | `AI_MODEL_API_KEY`       | unset   |
    /// | `AI_MODEL_TIMEOUT_SECS`  | `15`    |
    /// | `AI_MODEL_MAX_RETRIES`   | `3`     |
    pub fn from_env() -> Result<Self, CoreError> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Ok(Self {
            endpoint: non_empty("AI_MODEL_ENDPOINT"),
            api_key: non_empty("AI_MODEL_API_KEY"),
            timeout: Duration::from_secs(env_parse("AI_MODEL_TIMEOUT_SECS", 15u64)?),
            max_retries: env_parse("AI_MODEL_MAX_RETRIES", 3u32)?.max(1),
        })
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Turns instructions into raw (untrusted) script text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, GenerationError>;
}

/// Request/response dialect of the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    /// Chat completions with bearer auth.
    OpenAi,
    /// Chat completions with the raw key as the `Authorization` value.
    Zhipu,
    /// Single `prompt` field; text read from `generated_code` or `output`.
    Generic,
}

impl ApiFormat {
    pub fn detect(endpoint: &str) -> Self {
        if endpoint.contains("openai.com") {
            Self::OpenAi
        } else if endpoint.contains("bigmodel.cn") {
            Self::Zhipu
        } else {
            Self::Generic
        }
    }

    pub fn request_body(self, system_prompt: &str, user_prompt: &str) -> Value {
        let messages = json!([
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_prompt},
        ]);
        match self {
            Self::OpenAi => json!({
                "model": "gpt-3.5-turbo",
                "messages": messages,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }),
            Self::Zhipu => json!({
                "model": "glm-4",
                "messages": messages,
                "temperature": TEMPERATURE,
            }),
            Self::Generic => json!({
                "prompt": format!("{system_prompt}\n\n{user_prompt}"),
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }),
        }
    }

    pub fn authorization(self, api_key: &str) -> String {
        match self {
            Self::Zhipu => api_key.to_string(),
            Self::OpenAi | Self::Generic => format!("Bearer {api_key}"),
        }
    }

    /// Pull the generated text out of a response body. Missing fields yield
    /// an empty string.
    pub fn extract_text(self, body: &Value) -> String {
        let choice = body.get("choices").and_then(|c| c.get(0));
        let text = match (self, choice) {
            (Self::Zhipu, choice) => choice
                .and_then(|c| c.pointer("/message/content"))
                .and_then(Value::as_str),
            (_, Some(choice)) => choice
                .pointer("/message/content")
                .or_else(|| choice.get("text"))
                .and_then(Value::as_str),
            (_, None) => ["generated_code", "output"]
                .iter()
                .filter_map(|key| body.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty()),
        };
        text.unwrap_or_default().to_string()
    }
}

/// HTTP generation backend.
pub struct HttpGenerationBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    format: ApiFormat,
    retry: RetryPolicy,
}

impl HttpGenerationBackend {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            format: ApiFormat::detect(&endpoint),
            endpoint,
            api_key,
            retry,
        })
    }

    pub fn format(&self) -> ApiFormat {
        self.format
    }

    /// Execute a single POST request and extract the generated text.
    async fn try_generate(&self, body: &Value) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, self.format.authorization(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        Ok(self.format.extract_text(&json))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let body = self.format.request_body(system_prompt, user_prompt);
        let mut delay = self.retry.initial_delay;
        let mut attempt = 1u32;

        loop {
            match self.try_generate(&body).await {
                Ok(text) => {
                    tracing::debug!(attempt, chars = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Err(e) if attempt >= self.retry.max_attempts => {
                    tracing::error!(attempt, error = %e, "Generation failed after all retries");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Generation attempt failed, retrying",
                    );
                }
            }
            tokio::time::sleep(delay).await;
            delay = next_delay(delay, &self.retry);
            attempt += 1;
        }
    }
}

/// Returns the built-in sample scene without calling out.
#[derive(Debug, Clone, Default)]
pub struct SampleBackend;

#[async_trait]
impl GenerationBackend for SampleBackend {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
        Ok(SAMPLE_SCRIPT.to_string())
    }
}

/// The HTTP backend when endpoint and key are both set, else the sample.
pub fn backend_from_config(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
    match (&config.endpoint, &config.api_key) {
        (Some(endpoint), Some(api_key)) => {
            let retry = RetryPolicy {
                max_attempts: config.max_retries,
                ..RetryPolicy::default()
            };
            let backend =
                HttpGenerationBackend::new(endpoint.clone(), api_key.clone(), config.timeout, retry)?;
            tracing::info!(format = ?backend.format(), "Using HTTP generation backend");
            Ok(Arc::new(backend))
        }
        _ => {
            tracing::warn!("Generation backend not configured, using the sample scene");
            Ok(Arc::new(SampleBackend))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
