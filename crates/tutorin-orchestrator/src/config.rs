//! Configuration for the Tutorín server.
//!
//! Settings are read from `tutorin.json` (camelCase keys). Every field has a
//! default, so a missing file or a partial file is fine; values are validated
//! after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tutorin_steps::Cycle;

use crate::error::{Result, TutorError};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "tutorin.json";

/// Environment variable that overrides the configured hint model.
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL";

const fn default_port() -> u16 {
    8000
}

fn default_database() -> String {
    "tutorin.db".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "https://tutorin.netlify.app".to_string(),
    ]
}

const fn default_history_limit() -> usize {
    50
}

const fn default_history_max() -> usize {
    200
}

const fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

const fn default_hint_timeout() -> u64 {
    8
}

const fn default_temperature() -> f32 {
    0.5
}

/// Main configuration for the Tutorín server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// TCP port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_database")]
    pub database: String,

    /// Cycle used when a request does not name one.
    #[serde(default)]
    pub default_cycle: Cycle,

    /// Origins allowed by CORS; `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Paging limits for `GET /history`.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Generative hint backend.
    #[serde(default)]
    pub hints: HintsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            database: default_database(),
            default_cycle: Cycle::default(),
            cors_origins: default_cors_origins(),
            history: HistoryConfig::default(),
            hints: HintsConfig::default(),
        }
    }
}

impl Config {
    /// Loads `tutorin.json` from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid JSON or fails
    /// validation.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            TutorError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `tutorin.json` from `dir`, or defaults if it is absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ConfigParseError` if the file cannot be read or
    /// parsed, and `TutorError::ConfigValidationError` if a value is out of
    /// range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(TutorError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TutorError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ConfigValidationError` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(TutorError::config_validation(
                "port must not be 0",
                "Set port to a free TCP port in your tutorin.json (default 8000)",
            ));
        }

        if self.database.trim().is_empty() {
            return Err(TutorError::config_validation(
                "database path must not be empty",
                "Provide a database file path in your tutorin.json (e.g. \"tutorin.db\")",
            ));
        }

        if self.history.max_limit == 0
            || self.history.default_limit == 0
            || self.history.default_limit > self.history.max_limit
        {
            return Err(TutorError::config_validation(
                format!(
                    "history.defaultLimit ({}) must be between 1 and history.maxLimit ({})",
                    self.history.default_limit, self.history.max_limit
                ),
                "Lower history.defaultLimit or raise history.maxLimit in your tutorin.json",
            ));
        }

        if self.hints.timeout_seconds == 0 {
            return Err(TutorError::config_validation(
                "hints.timeoutSeconds must be greater than 0",
                "Set hints.timeoutSeconds to at least 1 second in your tutorin.json",
            ));
        }

        if self.hints.model.trim().is_empty() {
            return Err(TutorError::config_validation(
                "hints.model must not be empty",
                "Name a chat model in hints.model (e.g. \"gpt-4o-mini\")",
            ));
        }

        Ok(())
    }

    /// Whether every origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o.trim() == "*")
    }
}

/// Paging limits for the history listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Rows returned when the request names no limit.
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,

    /// Largest accepted `limit`.
    #[serde(default = "default_history_max")]
    pub max_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
            max_limit: default_history_max(),
        }
    }
}

/// Settings of the OpenAI-compatible generative hint backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintsConfig {
    /// Whether the backend may be used at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout.
    #[serde(default = "default_hint_timeout")]
    pub timeout_seconds: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_hint_timeout(),
            temperature: default_temperature(),
        }
    }
}

impl HintsConfig {
    /// The model to use, honouring the `OPENAI_MODEL` override.
    #[must_use]
    pub fn resolved_model(&self) -> String {
        std::env::var(MODEL_ENV_VAR)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.model.clone())
    }

    /// The API key from the configured variable, if set and non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}
