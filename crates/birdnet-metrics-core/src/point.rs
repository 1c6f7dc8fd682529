use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single `(timestamp, value)` sample. Immutable once created.
///
/// `timestamp` is the unix time in milliseconds at the record site — not a
/// logical/Lamport clock, just wall time. Two points with identical
/// timestamps are both valid and both retained; callers never rely on
/// timestamps for ordering within a single `RingBuffer` because insertion
/// order already provides that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl MetricPoint {
    #[must_use]
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Build a point stamped with the current wall-clock time.
    #[must_use]
    pub fn now(value: f64) -> Self {
        Self {
            timestamp: unix_millis(),
            value,
        }
    }
}

#[must_use]
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_positive_after_epoch() {
        let p = MetricPoint::now(1.0);
        assert!(p.timestamp > 0);
        assert_eq!(p.value, 1.0);
    }
}
