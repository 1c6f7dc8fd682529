//! Database callback instrumentation.
//!
//! Binds into the data-access layer so every query is timed and fed into
//! [`birdnet_metrics_core::Counters`]. `rusqlite`'s own `profile`/`trace`
//! hooks only accept bare `fn` pointers with no user data, so instead of
//! fighting that we wrap the connection: [`InstrumentedConnection`] is a
//! thin "before hook, run statement, after hook" layer around the handful
//! of execute/query entry points a caller needs, in the spirit of the
//! before/after event pairs the legacy data-access layer registered.

#![forbid(unsafe_code)]

mod classify;
mod error;

pub use classify::{classify, OperationClass};
pub use error::{is_lock_error_message, rusqlite_is_lock_contention, DbError, Result};

use birdnet_metrics_core::Counters;
use rusqlite::{Connection, Params, Row};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Wraps a `rusqlite::Connection`, timing every statement and feeding the
/// duration into the correct `Counters` bucket.
///
/// If `counters` is `None` the wrapper is inert: statements still run, but
/// nothing is recorded — the absent-instrumentation case collapses to
/// "construct with `None`", since a missing connection simply can't be
/// wrapped at all.
pub struct InstrumentedConnection {
    conn: Connection,
    counters: Option<Arc<Counters>>,
}

impl InstrumentedConnection {
    #[must_use]
    pub fn new(conn: Connection, counters: Option<Arc<Counters>>) -> Self {
        Self { conn, counters }
    }

    #[must_use]
    pub fn inner(&self) -> &Connection {
        &self.conn
    }

    /// Execute a non-row-returning statement (INSERT/UPDATE/DELETE/raw-exec).
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let start = Instant::now();
        let result = self.conn.execute(sql, params);
        self.after(sql, start.elapsed(), result.as_ref().err());
        result.map_err(DbError::from)
    }

    /// Run a single-row query (SELECT).
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let start = Instant::now();
        let result = self.conn.query_row(sql, params, f);
        self.after(sql, start.elapsed(), result.as_ref().err());
        result.map_err(DbError::from)
    }

    /// Run a multi-row query (SELECT returning any number of rows), timing
    /// the prepare, row iteration, and collection as one "row" operation.
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let start = Instant::now();
        let result = (|| {
            let mut stmt = self.conn.prepare(sql)?;
            stmt.query_map(params, f)?.collect::<rusqlite::Result<Vec<T>>>()
        })();
        self.after(sql, start.elapsed(), result.as_ref().err());
        result.map_err(DbError::from)
    }

    /// Record the outcome of one statement: duration into the class bucket
    /// implied by the SQL text, plus a busy-timeout tick if the error
    /// (when present) indicates transient lock contention.
    ///
    /// Silently drops the sample when no `Counters` is attached, rather
    /// than panicking: instrumentation must never propagate an error up
    /// into the caller's query path.
    fn after(&self, sql: &str, elapsed: std::time::Duration, err: Option<&rusqlite::Error>) {
        let Some(counters) = &self.counters else {
            return;
        };

        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        match classify::classify(sql) {
            OperationClass::Read => counters.record_read(micros),
            OperationClass::Write => counters.record_write(micros),
        }

        if let Some(err) = err {
            if rusqlite_is_lock_contention(err) {
                counters.record_busy_timeout();
                warn!(sql = %truncate(sql, 200), "database busy/locked");
            }
        }
    }
}

fn truncate(sql: &str, max: usize) -> String {
    if sql.len() > max {
        format!("{}...", &sql[..max])
    } else {
        sql.to_string()
    }
}
