//! Generative hint backend.
//!
//! Only used when no scripted hint exists for a step. Built once at startup
//! and shared through the [`super::HintSelector`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::HintsConfig;
use crate::error::HintBackendError;

const MAX_TOKENS: u32 = 120;

/// Something that can write a hint from a system and a user prompt.
#[async_trait]
pub trait HintBackend: Send + Sync {
    /// Returns the generated hint, or `None` when generation failed.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiBackend {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OpenAiBackend {
    /// Creates a backend with an explicit key.
    ///
    /// # Errors
    ///
    /// Returns `HintBackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &HintsConfig, api_key: String) -> Result<Self, HintBackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.resolved_model(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Creates a backend from configuration and the environment.
    ///
    /// # Errors
    ///
    /// Returns `HintBackendError::MissingApiKey` when hints are enabled but
    /// the key variable is unset, so the caller can decide to run without.
    pub fn from_config(config: &HintsConfig) -> Result<Self, HintBackendError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| HintBackendError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    /// The model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, HintBackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system_prompt.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user_prompt.into(),
                },
            ],
            temperature: self.temperature,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(HintBackendError::Api {
                status,
                message: body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            HintBackendError::InvalidResponse(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| HintBackendError::InvalidResponse("no completion in response".into()))
    }

    fn classify(&self, err: reqwest::Error) -> HintBackendError {
        if err.is_timeout() {
            HintBackendError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            HintBackendError::Http(err)
        }
    }
}

#[async_trait]
impl HintBackend for OpenAiBackend {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Option<String> {
        match self.complete(system_prompt, user_prompt).await {
            Ok(text) => {
                debug!(model = %self.model, chars = text.chars().count(), "Generated hint");
                Some(text)
            }
            Err(e) => {
                warn!(model = %self.model, transient = e.is_transient(), error = %e, "Hint backend failed");
                None
            }
        }
    }
}
