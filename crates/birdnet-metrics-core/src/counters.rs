use crate::point::unix_millis;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Duration, in microseconds, above which a database call counts as slow.
/// Comparison is strict: a call lasting exactly this long is not slow.
pub const DEFAULT_SLOW_THRESHOLD_MICROS: u64 = 100_000;

/// Lock-free per-database accumulators.
///
/// All fields are plain atomics; every operation here is O(1) and never
/// blocks. `ReadMaxMicros`/`WriteMaxMicros` are reset-on-read by
/// [`Counters::snapshot`] via an atomic swap, so no producer can observe its
/// own contribution silently dropped and each collection window sees
/// exactly one value.
#[derive(Debug)]
pub struct Counters {
    read_count: AtomicU64,
    read_total_micros: AtomicU64,
    read_max_micros: AtomicU64,
    write_count: AtomicU64,
    write_total_micros: AtomicU64,
    write_max_micros: AtomicU64,
    slow_query_count: AtomicU64,
    busy_timeouts: AtomicU64,
    slow_threshold_micros: u64,
}

/// A consistent point-in-time read of all counter fields.
///
/// `read_max_micros`/`write_max_micros` are zeroed by the act of taking this
/// snapshot; cumulative fields are unaffected and never decrease across the
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub collected_at_millis: i64,
    pub read_count: u64,
    pub read_total_micros: u64,
    pub read_max_micros: u64,
    pub write_count: u64,
    pub write_total_micros: u64,
    pub write_max_micros: u64,
    pub slow_queries: u64,
    pub busy_timeouts: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

impl Counters {
    #[must_use]
    pub fn new() -> Self {
        Self::with_slow_threshold(DEFAULT_SLOW_THRESHOLD_MICROS)
    }

    #[must_use]
    pub fn with_slow_threshold(slow_threshold_micros: u64) -> Self {
        Self {
            read_count: AtomicU64::new(0),
            read_total_micros: AtomicU64::new(0),
            read_max_micros: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            write_total_micros: AtomicU64::new(0),
            write_max_micros: AtomicU64::new(0),
            slow_query_count: AtomicU64::new(0),
            busy_timeouts: AtomicU64::new(0),
            slow_threshold_micros,
        }
    }

    /// Record a read (SELECT / row-iteration) call of `duration_micros`.
    pub fn record_read(&self, duration_micros: u64) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.read_total_micros
            .fetch_add(duration_micros, Ordering::Relaxed);
        fetch_max_u64(&self.read_max_micros, duration_micros);
        self.record_slow_if_over_threshold(duration_micros);
    }

    /// Record a write (INSERT/UPDATE/DELETE/raw-exec) call of
    /// `duration_micros`.
    pub fn record_write(&self, duration_micros: u64) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.write_total_micros
            .fetch_add(duration_micros, Ordering::Relaxed);
        fetch_max_u64(&self.write_max_micros, duration_micros);
        self.record_slow_if_over_threshold(duration_micros);
    }

    fn record_slow_if_over_threshold(&self, duration_micros: u64) {
        if duration_micros > self.slow_threshold_micros {
            self.slow_query_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a transient lock/busy engine error.
    pub fn record_busy_timeout(&self) {
        self.busy_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent snapshot of all fields, resetting the max fields
    /// to zero as part of the same call (exactly-once reset per snapshot).
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            collected_at_millis: unix_millis(),
            read_count: self.read_count.load(Ordering::Relaxed),
            read_total_micros: self.read_total_micros.load(Ordering::Relaxed),
            read_max_micros: self.read_max_micros.swap(0, Ordering::Relaxed),
            write_count: self.write_count.load(Ordering::Relaxed),
            write_total_micros: self.write_total_micros.load(Ordering::Relaxed),
            write_max_micros: self.write_max_micros.swap(0, Ordering::Relaxed),
            slow_queries: self.slow_query_count.load(Ordering::Relaxed),
            busy_timeouts: self.busy_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Atomic swap-with-zero is unsuitable for "max"; this is the usual
/// compare-and-swap retry loop: read current, stop if not greater, else CAS
/// and retry on contention.
#[inline]
fn fetch_max_u64(slot: &AtomicU64, value: u64) {
    let mut current = slot.load(Ordering::Relaxed);
    while value > current {
        match slot.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}
