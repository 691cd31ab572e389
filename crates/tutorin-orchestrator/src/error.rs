//! Error types for the Tutorín orchestrator.
//!
//! Only configuration and storage failures surface as errors. Parse failures,
//! unknown topics and wrong answers are ordinary [`crate::SolveStatus`]
//! outcomes, and generative hint failures are recovered inside the hint
//! selector.

use std::path::PathBuf;

use tutorin_store::StoreError;

/// A specialized `Result` type for orchestrator operations.
pub type Result<T> = std::result::Result<T, TutorError>;

/// Errors that abort a request or prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your tutorin.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// The progress store failed; nothing was written for this request.
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Failures of the generative hint backend.
///
/// These never reach the pupil: the selector logs them and answers with a
/// fixed fallback hint.
#[derive(Debug, thiserror::Error)]
pub enum HintBackendError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response did not contain a completion.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The configured API key variable is not set.
    #[error("missing API key: environment variable '{0}' is not set")]
    MissingApiKey(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },
}

impl HintBackendError {
    /// Returns `true` if a later request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::MissingApiKey(_) => false,
        }
    }
}

impl TutorError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns `true` if this error is transient and the request may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_transient(),
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. } => false,
        }
    }

    /// Returns `true` if this error is a configuration problem the user
    /// has to fix before anything can run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_carry_suggestions() {
        let err = TutorError::config_validation("port must not be 0", "Pick a free port");
        let msg = err.to_string();
        assert!(msg.contains("port must not be 0"));
        assert!(msg.contains("Suggestion: Pick a free port"));
        assert!(err.is_fatal());
        assert!(!err.is_transient());

        let err = TutorError::config_parse("/tmp/tutorin.json", "expected value");
        assert!(err.to_string().contains("/tmp/tutorin.json"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_version_conflict_is_transient() {
        let err: TutorError = StoreError::version_conflict("ex-1", 1, 2).into();
        assert!(err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_backend_error_classification() {
        let rate_limited = HintBackendError::Api {
            status: 429,
            message: "slow down".into(),
        };
        assert!(rate_limited.is_transient());

        let unauthorized = HintBackendError::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert!(!unauthorized.is_transient());
        assert!(HintBackendError::Timeout { seconds: 8 }.is_transient());
        assert!(!HintBackendError::MissingApiKey("OPENAI_API_KEY".into()).is_transient());
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let err: TutorError = StoreError::from(std::io::Error::other("disk full")).into();
        assert!(err.to_string().starts_with("Storage failure"));
        assert!(!err.is_fatal());
    }
}
