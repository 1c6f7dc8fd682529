use thiserror::Error;

/// Result type alias for `birdnet-db` operations.
pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Whether this error indicates a transient lock/busy condition that is
    /// safe to classify as a busy timeout rather than a hard failure.
    #[must_use]
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Self::Sqlite(e) => rusqlite_is_lock_contention(e),
        }
    }
}

/// Whether a raw `rusqlite::Error` indicates a transient lock/busy
/// condition — the typed error code when the driver surfaces one, falling
/// back to the textual markers for paths that only give us a message.
#[must_use]
pub fn rusqlite_is_lock_contention(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        other => is_lock_error_message(&other.to_string()),
    }
}

/// Check whether an error message indicates a database lock/busy condition.
///
/// Matches the textual markers for lock contention — `"database is
/// locked"` / `"SQLITE_BUSY"` and the analogous MySQL lock-wait phrasing —
/// for engines or error paths that don't surface a typed error code.
#[must_use]
pub fn is_lock_error_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("database is locked")
        || lower.contains("sqlite_busy")
        || lower.contains("database is busy")
        || lower.contains("lock wait timeout")
        || lower.contains("deadlock found")
}
