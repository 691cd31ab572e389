//! Progress and history storage for Tutorín.
//!
//! Every exercise has one [`ProgressRecord`]: the sub-step the pupil is on,
//! how many wrong answers they gave at that step, the transcript shown so far
//! and a small structured [`ExerciseState`]. Each turn also appends one
//! [`HistoryEntry`] to an audit log.
//!
//! The only backend is SQLite ([`ProgressStore`]). Records are created on
//! first read and never disappear except through an explicit reset.

pub mod sqlite;

pub use sqlite::ProgressStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for `error_count`.
pub const MAX_ERROR_COUNT: u8 = 9;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the progress store.
///
/// All of them abort the request that triggered them; nothing is partially
/// committed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The SQLite layer failed.
    #[error("Database error: {0}\n\nSuggestion: Check that the database file is writable and not used by an incompatible version")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The structured state column could not be encoded or decoded.
    #[error("Corrupted exercise state: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Someone else wrote the record since it was read.
    #[error("Exercise '{exercise_id}' was modified concurrently (expected version {expected}, found {found})\n\nSuggestion: Reload the exercise and retry")]
    VersionConflict {
        /// The exercise being written.
        exercise_id: String,
        /// Version the writer read.
        expected: i64,
        /// Version currently stored.
        found: i64,
    },
}

impl StoreError {
    /// Creates a new `VersionConflict`.
    #[must_use]
    pub fn version_conflict(exercise_id: impl Into<String>, expected: i64, found: i64) -> Self {
        Self::VersionConflict {
            exercise_id: exercise_id.into(),
            expected,
            found,
        }
    }

    /// Returns `true` if retrying with a fresh read may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Records
// ============================================================================

/// Structured state kept next to the transcript.
///
/// `operands` is the canonical expression the topic engine recovered from the
/// first statement, so later turns can keep working when the pupil's question
/// text no longer contains the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseState {
    /// Topic wire name (`"fracciones"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Canonical expression for that topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operands: Option<String>,
}

/// Progress of one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Opaque exercise identifier.
    pub exercise_id: String,
    /// Pupil the exercise belongs to.
    pub user_id: String,
    /// Index of the sub-step being asked.
    pub current_step: usize,
    /// Consecutive wrong answers at `current_step`, within `0..=9`.
    pub error_count: u8,
    /// Every message shown so far, newline separated.
    pub context: String,
    /// Cached topic and operands.
    pub state: ExerciseState,
    /// Optimistic concurrency token; 0 until first written.
    pub version: i64,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// A zero-initialized record.
    #[must_use]
    pub fn new(exercise_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            user_id: user_id.into(),
            current_step: 0,
            error_count: 0,
            context: String::new(),
            state: ExerciseState::default(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Appends a shown message to the transcript.
    pub fn push_context(&mut self, message: &str) {
        let joined = format!("{}\n{}", self.context, message);
        self.context = joined.trim().to_string();
    }
}

/// A history row about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistory {
    /// Pupil that sent the turn.
    pub user_id: String,
    /// Exercise the turn belongs to.
    pub exercise_id: String,
    /// Question text as received.
    pub question: String,
    /// Answer as received (may be empty).
    pub last_answer: String,
    /// Message returned to the pupil.
    pub response: String,
    /// Step after the turn.
    pub step: usize,
    /// Error count after the turn.
    pub error_count: u8,
}

/// A stored history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Auto-increment id.
    pub id: i64,
    /// Pupil that sent the turn.
    pub user_id: String,
    /// Exercise the turn belongs to.
    pub exercise_id: String,
    /// Question text as received.
    pub question: String,
    /// Answer as received.
    pub last_answer: String,
    /// Message returned to the pupil.
    pub response: String,
    /// Step after the turn.
    pub step: usize,
    /// Error count after the turn.
    pub error_count: u8,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_context_trims() {
        let mut record = ProgressRecord::new("ex-1", "anon");
        record.push_context("primera");
        record.push_context("segunda\n");
        assert_eq!(record.context, "primera\nsegunda");
    }

    #[test]
    fn test_state_json_omits_empty_fields() {
        let json = serde_json::to_string(&ExerciseState::default()).unwrap();
        assert_eq!(json, "{}");

        let state = ExerciseState {
            topic: Some("fracciones".into()),
            operands: Some("2/3+1/4".into()),
        };
        let back: ExerciseState =
            serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_version_conflict_is_transient() {
        let err = StoreError::version_conflict("ex-1", 2, 3);
        assert!(err.is_transient());
        let msg = err.to_string();
        assert!(msg.contains("ex-1"));
        assert!(msg.contains("Suggestion"));
    }
}
