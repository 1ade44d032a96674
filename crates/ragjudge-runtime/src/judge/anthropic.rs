//! Anthropic Messages API judge.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Judge, JudgeConfig, JudgeError};

/// Environment variable name for Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// A judge backed by Claude through the Anthropic Messages API.
///
/// The API key is stored as a [`SecretString`] and is only exposed when the
/// request header is built.
pub struct AnthropicJudge {
    api_key: SecretString,
    base_url: String,
    config: JudgeConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicJudge")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl AnthropicJudge {
    /// Create a judge with the default configuration.
    pub fn new(api_key: impl Into<String>) -> Result<Self, JudgeError> {
        Self::with_config(api_key, JudgeConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: JudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| JudgeError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            config,
            client,
        })
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, JudgeError> {
        let key = std::env::var(ANTHROPIC_API_KEY_ENV).map_err(|_| {
            JudgeError::NotConfigured(format!("{} is not set", ANTHROPIC_API_KEY_ENV))
        })?;
        if key.trim().is_empty() {
            return Err(JudgeError::NotConfigured(format!(
                "{} is empty",
                ANTHROPIC_API_KEY_ENV
            )));
        }
        Self::new(key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl AnthropicJudge {
    fn request<'a>(&'a self, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: &self.config.system_prompt,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl Judge for AnthropicJudge {
    async fn generate(&self, prompt: &str) -> Result<String, JudgeError> {
        let request = self.request(prompt);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JudgeError::Timeout(self.config.timeout)
                } else {
                    JudgeError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(JudgeError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(e) => e.to_string(),
            };
            return Err(JudgeError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::DecodeError(e.to_string()))?;

        Ok(body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
