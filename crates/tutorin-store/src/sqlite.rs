//! SQLite implementation of the progress store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::{
    ExerciseState, HistoryEntry, NewHistory, ProgressRecord, Result, StoreError, MAX_ERROR_COUNT,
};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS progress (
  exercise_id TEXT PRIMARY KEY,
  user_id TEXT NOT NULL,
  step INTEGER NOT NULL DEFAULT 0,
  error_count INTEGER NOT NULL DEFAULT 0,
  context TEXT NOT NULL DEFAULT '',
  state TEXT NOT NULL DEFAULT '{}',
  version INTEGER NOT NULL DEFAULT 0,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS history (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id TEXT NOT NULL,
  exercise_id TEXT NOT NULL,
  question TEXT NOT NULL,
  last_answer TEXT NOT NULL,
  response TEXT NOT NULL,
  step INTEGER NOT NULL,
  error_count INTEGER NOT NULL,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_user ON history(user_id, id);
";

/// Progress store backed by one SQLite connection.
///
/// The connection sits behind a mutex so the store can be shared across
/// request handlers; each operation holds it for a single statement or
/// transaction.
#[derive(Debug)]
pub struct ProgressStore {
    conn: Mutex<Connection>,
}

impl ProgressStore {
    /// Opens (or creates) the database file at `path` and bootstraps the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;")?;
        info!(path = %path.display(), "Opened progress database");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite half-written:
        // every write goes through a transaction.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the record for `exercise_id`, creating a zeroed one if absent.
    pub fn get(&self, exercise_id: &str, user_id: &str) -> Result<ProgressRecord> {
        let conn = self.lock();
        let fresh = ProgressRecord::new(exercise_id, user_id);
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO progress (exercise_id, user_id, updated_at) VALUES (?1, ?2, ?3)",
            params![exercise_id, user_id, fresh.updated_at],
        )?;
        if inserted > 0 {
            debug!(exercise_id, user_id, "Created progress record");
        }
        Ok(select_progress(&conn, exercise_id)?.unwrap_or(fresh))
    }

    /// Returns the record for `exercise_id` without creating it.
    pub fn find(&self, exercise_id: &str) -> Result<Option<ProgressRecord>> {
        select_progress(&self.lock(), exercise_id)
    }

    /// Writes `record` if its version is still current.
    ///
    /// Returns the stored record with the bumped version. A record that was
    /// never stored must carry version 0.
    pub fn upsert(&self, record: &ProgressRecord) -> Result<ProgressRecord> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let stored = write_progress(&tx, record)?;
        tx.commit()?;
        Ok(stored)
    }

    /// Appends one history row and returns its id.
    pub fn append_history(&self, entry: &NewHistory) -> Result<i64> {
        insert_history(&self.lock(), entry)
    }

    /// Writes the progress update and its history row atomically.
    pub fn record_turn(&self, record: &ProgressRecord, entry: &NewHistory) -> Result<ProgressRecord> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let stored = write_progress(&tx, record)?;
        insert_history(&tx, entry)?;
        tx.commit()?;
        Ok(stored)
    }

    /// Lists history rows newest first, optionally for one user.
    pub fn list_history(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            r"
            SELECT id, user_id, exercise_id, question, last_answer, response, step,
                   error_count, created_at
            FROM history
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            ",
        )?;
        let rows = stmt.query_map(params![user_id, limit], history_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Deletes the progress record of one exercise. Returns whether it existed.
    pub fn reset_progress(&self, exercise_id: &str) -> Result<bool> {
        let deleted = self.lock().execute(
            "DELETE FROM progress WHERE exercise_id = ?1",
            params![exercise_id],
        )?;
        info!(exercise_id, deleted, "Reset exercise progress");
        Ok(deleted > 0)
    }

    /// Wipes both tables. Returns `(progress rows, history rows)` deleted.
    pub fn reset_all(&self) -> Result<(usize, usize)> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let progress = tx.execute("DELETE FROM progress", [])?;
        let history = tx.execute("DELETE FROM history", [])?;
        tx.commit()?;
        info!(progress, history, "Reset the whole store");
        Ok((progress, history))
    }
}

// ============================================================================
// Row helpers
// ============================================================================

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> usize {
    usize::try_from(value).unwrap_or_default()
}

/// Raw progress row before the state column is decoded.
struct ProgressRow {
    exercise_id: String,
    user_id: String,
    step: i64,
    error_count: u8,
    context: String,
    state: String,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl ProgressRow {
    fn into_record(self) -> Result<ProgressRecord> {
        let state: ExerciseState = serde_json::from_str(&self.state)?;
        Ok(ProgressRecord {
            exercise_id: self.exercise_id,
            user_id: self.user_id,
            current_step: from_sql_int(self.step),
            error_count: self.error_count.min(MAX_ERROR_COUNT),
            context: self.context,
            state,
            version: self.version,
            updated_at: self.updated_at,
        })
    }
}

fn select_progress(conn: &Connection, exercise_id: &str) -> Result<Option<ProgressRecord>> {
    let row = conn
        .query_row(
            r"
            SELECT exercise_id, user_id, step, error_count, context, state, version, updated_at
            FROM progress
            WHERE exercise_id = ?1
            ",
            params![exercise_id],
            |row| {
                Ok(ProgressRow {
                    exercise_id: row.get(0)?,
                    user_id: row.get(1)?,
                    step: row.get(2)?,
                    error_count: row.get(3)?,
                    context: row.get(4)?,
                    state: row.get(5)?,
                    version: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            },
        )
        .optional()?;
    row.map(ProgressRow::into_record).transpose()
}

fn write_progress(conn: &Connection, record: &ProgressRecord) -> Result<ProgressRecord> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT version FROM progress WHERE exercise_id = ?1",
            params![record.exercise_id],
            |row| row.get(0),
        )
        .optional()?;
    let current = found.unwrap_or(0);
    if current != record.version {
        return Err(StoreError::version_conflict(
            &record.exercise_id,
            record.version,
            current,
        ));
    }

    let mut stored = record.clone();
    stored.version = current + 1;
    stored.error_count = record.error_count.min(MAX_ERROR_COUNT);
    stored.updated_at = Utc::now();

    conn.execute(
        r"
        INSERT INTO progress (exercise_id, user_id, step, error_count, context, state, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(exercise_id) DO UPDATE SET
          user_id = excluded.user_id,
          step = excluded.step,
          error_count = excluded.error_count,
          context = excluded.context,
          state = excluded.state,
          version = excluded.version,
          updated_at = excluded.updated_at
        ",
        params![
            stored.exercise_id,
            stored.user_id,
            to_sql_int(stored.current_step),
            stored.error_count,
            stored.context,
            serde_json::to_string(&stored.state)?,
            stored.version,
            stored.updated_at,
        ],
    )?;
    debug!(
        exercise_id = %stored.exercise_id,
        step = stored.current_step,
        error_count = stored.error_count,
        version = stored.version,
        "Stored progress"
    );
    Ok(stored)
}

fn insert_history(conn: &Connection, entry: &NewHistory) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO history (user_id, exercise_id, question, last_answer, response, step, error_count, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ",
        params![
            entry.user_id,
            entry.exercise_id,
            entry.question,
            entry.last_answer,
            entry.response,
            to_sql_int(entry.step),
            entry.error_count.min(MAX_ERROR_COUNT),
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exercise_id: row.get(2)?,
        question: row.get(3)?,
        last_answer: row.get(4)?,
        response: row.get(5)?,
        step: from_sql_int(row.get(6)?),
        error_count: row.get(7)?,
        created_at: row.get(8)?,
    })
}
